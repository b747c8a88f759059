use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidWindow(format!(
                "window end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DateWindow) -> bool {
        !(self.end < other.start || other.end < self.start)
    }
}

/// Promotion mechanics of a product campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CampaignKind {
    /// Flat percent off the line price.
    Discount { percent: u32 },
    /// Buy `buy` units, get `get` more of the same product free.
    BuyXGetY { buy: u32, get: u32 },
}

impl CampaignKind {
    /// Percent-off equivalent of the mechanic.
    pub fn equivalent_percent(&self) -> f64 {
        match *self {
            CampaignKind::Discount { percent } => f64::from(percent),
            CampaignKind::BuyXGetY { buy, get } => bundle_equivalent_percent(buy, get),
        }
    }

    pub fn is_bundle(&self) -> bool {
        matches!(self, CampaignKind::BuyXGetY { .. })
    }
}

/// Scheduled product campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: u32,
    pub name: String,
    pub product_id: u32,
    #[serde(flatten)]
    pub kind: CampaignKind,
    pub window: DateWindow,
}

impl Campaign {
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.window.contains(date)
    }
}

/// Link between a campaign and the product it promotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignAssignment {
    pub campaign_id: u32,
    pub product_id: u32,
}

/// Personalized percent-off offer for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOffer {
    pub id: u32,
    pub customer_id: u32,
    pub percent_off: f64,
    pub window: DateWindow,
}

impl CustomerOffer {
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.window.contains(date)
    }
}

/// Discount-percent equivalent of "buy X get Y free": `100 * Y / (X + Y)`.
pub fn bundle_equivalent_percent(buy: u32, get: u32) -> f64 {
    if buy == 0 {
        return 0.0;
    }
    100.0 * f64::from(get) / f64::from(buy + get)
}

/// Combine a product discount with a personal discount multiplicatively.
///
/// Both inputs and the result are percentages; the result is rounded to two
/// decimals.
pub fn stack_discounts(product_pct: f64, customer_pct: f64) -> f64 {
    let combined = 1.0 - (1.0 - product_pct / 100.0) * (1.0 - customer_pct / 100.0);
    round2(combined * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn window_rejects_reversed_bounds() {
        let result = DateWindow::new(date(2024, 3, 10), date(2024, 3, 1));
        assert!(matches!(result, Err(Error::InvalidWindow(_))));
    }

    #[test]
    fn window_length_is_inclusive() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 7)).expect("window");
        assert_eq!(window.len_days(), 7);
        assert!(window.contains(date(2024, 3, 1)));
        assert!(window.contains(date(2024, 3, 7)));
        assert!(!window.contains(date(2024, 3, 8)));
    }

    #[test]
    fn windows_sharing_a_day_overlap() {
        let a = DateWindow::new(date(2024, 3, 1), date(2024, 3, 7)).expect("a");
        let b = DateWindow::new(date(2024, 3, 7), date(2024, 3, 9)).expect("b");
        let c = DateWindow::new(date(2024, 3, 8), date(2024, 3, 9)).expect("c");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn bundle_equivalent_percent_matches_ratio() {
        assert!((bundle_equivalent_percent(2, 1) - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(bundle_equivalent_percent(3, 1), 25.0);
        assert_eq!(bundle_equivalent_percent(0, 1), 0.0);
        let kind = CampaignKind::BuyXGetY { buy: 3, get: 1 };
        assert_eq!(kind.equivalent_percent(), 25.0);
        assert!(kind.is_bundle());
    }

    #[test]
    fn stacked_discounts_multiply_instead_of_adding() {
        assert_eq!(stack_discounts(20.0, 10.0), 28.0);
        assert_eq!(stack_discounts(0.0, 10.0), 10.0);
        assert_eq!(stack_discounts(25.0, 0.0), 25.0);
    }

    #[test]
    fn quantities_round_to_three_decimals() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(2.0), 2.0);
    }
}
