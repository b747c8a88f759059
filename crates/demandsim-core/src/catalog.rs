use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Units of measure admitting only whole-number quantities.
pub const COUNTABLE_UOMS: &[&str] = &[
    "adet", "koli", "paket", "çuval", "şişe", "piece", "case", "pack", "bag", "bottle",
];

/// Returns true when the unit of measure only admits whole quantities.
pub fn is_countable_uom(uom: &str) -> bool {
    let normalized = uom.trim().to_lowercase();
    COUNTABLE_UOMS.contains(&normalized.as_str())
}

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub category: String,
    /// Unit of measure (ex.: `adet`, `kg`, `bottle`).
    #[serde(alias = "unit_of_measure")]
    pub uom: String,
    #[serde(default)]
    pub safety_stock: f64,
    #[serde(default)]
    pub reorder_point: f64,
    #[serde(alias = "current_price")]
    pub price: f64,
    /// Free-form tags matched against the peak-season table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Product {
    pub fn is_countable(&self) -> bool {
        is_countable_uom(&self.uom)
    }
}

/// Catalog customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Customer {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub segment: String,
}

/// Order propensity of a customer segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentBehavior {
    /// Base daily order rate.
    pub base_rate: f64,
    /// Multiplier applied to the base rate on weekends.
    #[serde(default = "default_weekend_mult")]
    pub weekend_mult: f64,
}

impl Default for SegmentBehavior {
    fn default() -> Self {
        Self {
            base_rate: 0.2,
            weekend_mult: 1.0,
        }
    }
}

impl SegmentBehavior {
    /// Order weight for a day, honoring the weekend multiplier.
    pub fn weight(&self, is_weekend: bool) -> f64 {
        if is_weekend {
            self.base_rate * self.weekend_mult
        } else {
            self.base_rate
        }
    }
}

fn default_weekend_mult() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countable_units_are_case_insensitive() {
        assert!(is_countable_uom("adet"));
        assert!(is_countable_uom(" Bottle "));
        assert!(is_countable_uom("şişe"));
        assert!(is_countable_uom("KOLI"));
        assert!(!is_countable_uom("kg"));
        assert!(!is_countable_uom("litre"));
    }

    #[test]
    fn segment_weight_applies_weekend_multiplier() {
        let behavior = SegmentBehavior {
            base_rate: 0.5,
            weekend_mult: 1.4,
        };
        assert_eq!(behavior.weight(false), 0.5);
        assert!((behavior.weight(true) - 0.7).abs() < 1e-12);
    }
}
