use std::collections::BTreeMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use demandsim_core::{Customer, Product, ProductDemandProfile, SegmentBehavior};

/// Run identity: horizon, country and master seed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MetaConfig {
    /// Display name of the world.
    #[serde(default)]
    pub name: String,
    /// First generated day (inclusive).
    pub start_date: NaiveDate,
    /// Last generated day (inclusive).
    pub end_date: NaiveDate,
    /// ISO 3166-1 alpha-2 code selecting the holiday table.
    #[serde(default = "default_country")]
    pub country: String,
    /// Master seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Demand model knobs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct TuningConfig {
    /// Global multiplier on the post-latent mean.
    pub demand_scale: f64,
    /// EMA smoothing constant; values outside (0, 1) disable smoothing.
    pub smooth_alpha: f64,
    /// Multiplier on every product dispersion (floored at 0.1).
    pub dispersion_scale: f64,
    /// AR(1) autoregressive coefficient.
    pub latent_rho: f64,
    /// AR(1) innovation standard deviation.
    pub latent_sigma: f64,
    /// Demand lift per 100% effective offer pressure.
    pub offer_effect_alpha: f64,
    /// Ceiling on the offer-pressure lift, in percent.
    pub offer_effect_cap_pct: f64,
    /// Global scaler on every product promo sensitivity.
    pub promo_effect_alpha: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            demand_scale: 1.0,
            smooth_alpha: 0.3,
            dispersion_scale: 1.5,
            latent_rho: 0.6,
            latent_sigma: 0.15,
            offer_effect_alpha: 0.6,
            offer_effect_cap_pct: 30.0,
            promo_effect_alpha: 1.0,
        }
    }
}

/// Quiet-day soft clamp knobs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ClampConfig {
    pub enabled: bool,
    /// Blend factor toward the sampled value (0 snaps to the reference).
    pub soft_lambda: f64,
    /// Number of reference days collected.
    pub window_days: u32,
    /// Half-width of the tolerance band as a fraction of the reference.
    pub band_pct: f64,
    /// Use the most recent same-weekday days instead of the last N days.
    pub same_weekday: bool,
    /// Campaign percent at or below which a day may be quiet.
    pub max_campaign_pct: f64,
    /// Offer pressure percent at or below which a day may be quiet.
    pub max_offer_pressure_pct: f64,
    /// Treat holidays and event days as never quiet.
    pub skip_specials: bool,
}

impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            soft_lambda: 0.5,
            window_days: 7,
            band_pct: 0.10,
            same_weekday: true,
            max_campaign_pct: 0.0,
            max_offer_pressure_pct: 0.0,
            skip_specials: false,
        }
    }
}

/// Product campaign scheduling policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct CampaignPolicy {
    pub per_year: f64,
    pub min_days: u32,
    pub max_days: u32,
    /// Probability of drawing the target month from the off-peak set.
    pub bias_probability: f64,
    /// Placement attempts per campaign before it is dropped.
    pub max_attempts: u32,
}

impl Default for CampaignPolicy {
    fn default() -> Self {
        Self {
            per_year: 3.0,
            min_days: 7,
            max_days: 21,
            bias_probability: 0.7,
            max_attempts: 500,
        }
    }
}

/// Personalized offer scheduling policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct OfferPolicy {
    pub per_year: f64,
    pub min_days: u32,
    pub max_days: u32,
    pub max_attempts: u32,
}

impl Default for OfferPolicy {
    fn default() -> Self {
        Self {
            per_year: 1.0,
            min_days: 7,
            max_days: 21,
            max_attempts: 500,
        }
    }
}

/// Sales order allocation policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct OrderPolicy {
    pub enabled: bool,
    /// Probabilities of 1, 2 and 3 lines per order.
    pub basket_size_probs: Vec<f64>,
    /// Probabilities of 1, 2 and 3 units per pick for countable products.
    pub countable_qty_probs: Vec<f64>,
    /// Units per pick for bulk products.
    pub noncountable_default_qty: f64,
    /// Customer weight lift per 100% personal offer.
    pub offer_uplift_alpha: f64,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            basket_size_probs: vec![0.6, 0.3, 0.1],
            countable_qty_probs: vec![0.7, 0.25, 0.05],
            noncountable_default_qty: 1.0,
            offer_uplift_alpha: 1.0,
        }
    }
}

/// End-of-horizon stock snapshot policy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct StockPolicy {
    pub enabled: bool,
    /// Trailing days averaged as the daily sales proxy.
    pub recent_days: u32,
    /// Days of cover held on hand, floored at 7.
    pub target_days_of_cover: u32,
    /// Half-width of the multiplicative on-hand noise.
    pub noise_pct: f64,
    /// Share of on-hand reserved, drawn uniformly from this range.
    pub reserved_min_pct: f64,
    pub reserved_max_pct: f64,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_days: 14,
            target_days_of_cover: 21,
            noise_pct: 0.10,
            reserved_min_pct: 0.02,
            reserved_max_pct: 0.06,
        }
    }
}

/// Peak-season months for a tag or category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PeakSeasonRule {
    pub name: String,
    /// Months (1-12); empty marks a known product without a peak.
    #[serde(default)]
    pub months: Vec<u32>,
}

impl PeakSeasonRule {
    pub fn new(name: &str, months: &[u32]) -> Self {
        Self {
            name: name.to_string(),
            months: months.to_vec(),
        }
    }
}

/// Explicit tag/category to peak-months table.
///
/// Tag rules are checked first, in table order; category rules are the
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct PeakSeasonTable {
    pub tags: Vec<PeakSeasonRule>,
    pub categories: Vec<PeakSeasonRule>,
}

impl Default for PeakSeasonTable {
    fn default() -> Self {
        Self {
            tags: vec![
                PeakSeasonRule::new("sunscreen", &[6, 7, 8]),
                PeakSeasonRule::new("air-conditioner", &[6, 7, 8]),
                PeakSeasonRule::new("ski", &[12, 1, 2]),
                PeakSeasonRule::new("thermo", &[11, 12, 1, 2]),
                PeakSeasonRule::new("dates", &[]),
                PeakSeasonRule::new("chocolate", &[2, 5, 11]),
                PeakSeasonRule::new("perfume", &[2, 5, 6, 11]),
                PeakSeasonRule::new("potato-chips", &[6, 7, 8]),
                PeakSeasonRule::new("energy-drink", &[]),
                PeakSeasonRule::new("notebook", &[8, 9]),
                PeakSeasonRule::new("flag", &[4, 5, 8, 10, 11]),
                PeakSeasonRule::new("tea", &[10, 11, 12, 1, 2]),
            ],
            categories: vec![PeakSeasonRule::new("appliances", &[6, 7, 8])],
        }
    }
}

impl PeakSeasonTable {
    /// Peak months for a product; empty when nothing matches.
    pub fn peak_months(&self, product: &Product) -> &[u32] {
        let tags: Vec<String> = product.tags.iter().map(|tag| tag.to_lowercase()).collect();
        if let Some(rule) = self
            .tags
            .iter()
            .find(|rule| tags.contains(&rule.name.to_lowercase()))
        {
            return &rule.months;
        }
        let category = product.category.to_lowercase();
        self.categories
            .iter()
            .find(|rule| rule.name.to_lowercase() == category)
            .map(|rule| rule.months.as_slice())
            .unwrap_or(&[])
    }

    /// Months outside the product's peak, or `None` when every month peaks.
    pub fn off_peak_months(&self, product: &Product) -> Option<Vec<u32>> {
        let peak = self.peak_months(product);
        let months: Vec<u32> = (1..=12).filter(|month| !peak.contains(month)).collect();
        if months.is_empty() { None } else { Some(months) }
    }
}

/// Demand profile override for one product.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductProfileEntry {
    pub product_id: u32,
    #[serde(flatten)]
    pub profile: ProductDemandProfile,
}

/// Canonical world definition for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    pub meta: MetaConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
    #[serde(default)]
    pub clamp: ClampConfig,
    #[serde(default)]
    pub campaigns: CampaignPolicy,
    #[serde(default)]
    pub offers: OfferPolicy,
    #[serde(default)]
    pub orders: OrderPolicy,
    #[serde(default)]
    pub stock: StockPolicy,
    #[serde(default)]
    pub peak_seasons: PeakSeasonTable,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    /// Order propensity per customer segment.
    #[serde(default)]
    pub segments: BTreeMap<String, SegmentBehavior>,
    /// Per-product demand profiles; archetype defaults apply otherwise.
    #[serde(default)]
    pub profiles: Vec<ProductProfileEntry>,
}

impl WorldConfig {
    /// Minimal world over a date range with an empty catalog.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, country: &str, seed: u64) -> Self {
        Self {
            meta: MetaConfig {
                name: String::new(),
                start_date,
                end_date,
                country: country.to_string(),
                seed,
            },
            tuning: TuningConfig::default(),
            clamp: ClampConfig::default(),
            campaigns: CampaignPolicy::default(),
            offers: OfferPolicy::default(),
            orders: OrderPolicy::default(),
            stock: StockPolicy::default(),
            peak_seasons: PeakSeasonTable::default(),
            products: Vec::new(),
            customers: Vec::new(),
            segments: BTreeMap::new(),
            profiles: Vec::new(),
        }
    }

    /// Profiles keyed by product id; later entries win.
    pub fn profile_map(&self) -> BTreeMap<u32, ProductDemandProfile> {
        self.profiles
            .iter()
            .map(|entry| (entry.product_id, entry.profile))
            .collect()
    }

    /// Effective profile for a product: override, then archetype, then default.
    pub fn profile_for(&self, product_id: u32) -> ProductDemandProfile {
        self.profiles
            .iter()
            .rev()
            .find(|entry| entry.product_id == product_id)
            .map(|entry| entry.profile)
            .or_else(|| ProductDemandProfile::archetype(product_id))
            .unwrap_or_default()
    }

    /// Segment behavior with the fallback used for unknown segments.
    pub fn segment(&self, name: &str) -> SegmentBehavior {
        self.segments.get(name).copied().unwrap_or_default()
    }
}

fn default_country() -> String {
    "TR".to_string()
}

fn default_seed() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(tags: &[&str], category: &str) -> Product {
        Product {
            id: 1,
            name: "Sample".to_string(),
            category: category.to_string(),
            uom: "adet".to_string(),
            safety_stock: 0.0,
            reorder_point: 0.0,
            price: 1.0,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[test]
    fn tag_rules_win_over_categories() {
        let table = PeakSeasonTable::default();
        let sunscreen = product(&["Sunscreen"], "appliances");
        assert_eq!(table.peak_months(&sunscreen), &[6, 7, 8]);

        let flag = product(&["gift", "flag"], "decor");
        assert_eq!(table.peak_months(&flag), &[4, 5, 8, 10, 11]);
    }

    #[test]
    fn category_fallback_and_unknown_products() {
        let table = PeakSeasonTable::default();
        let fan = product(&[], "Appliances");
        assert_eq!(table.peak_months(&fan), &[6, 7, 8]);

        let unknown = product(&["widget"], "misc");
        assert!(table.peak_months(&unknown).is_empty());
        assert_eq!(
            table.off_peak_months(&unknown).expect("all months"),
            (1..=12).collect::<Vec<u32>>()
        );
    }

    #[test]
    fn off_peak_excludes_peak_months() {
        let table = PeakSeasonTable::default();
        let ski = product(&["ski"], "sports");
        assert_eq!(
            table.off_peak_months(&ski).expect("off-peak months"),
            vec![3, 4, 5, 6, 7, 8, 9, 10, 11]
        );

        let all_year = PeakSeasonTable {
            tags: vec![PeakSeasonRule::new("ski", &(1..=12).collect::<Vec<u32>>())],
            categories: Vec::new(),
        };
        assert!(all_year.off_peak_months(&ski).is_none());
    }

    #[test]
    fn profile_lookup_prefers_overrides() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("start");
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).expect("end");
        let mut world = WorldConfig::new(start, end, "TR", 7);
        assert_eq!(world.profile_for(1008).base_rate, 6.0);
        assert_eq!(world.profile_for(5555).base_rate, 2.0);

        world.profiles.push(ProductProfileEntry {
            product_id: 1008,
            profile: ProductDemandProfile::flat(9.0),
        });
        assert_eq!(world.profile_for(1008).base_rate, 9.0);
    }
}
