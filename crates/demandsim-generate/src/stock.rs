use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use serde::Serialize;

use demandsim_config::{StockPolicy, WorldConfig};
use demandsim_core::{Product, round3};

use crate::demand::{DemandSet, ProductSeries};
use crate::seed::keyed_stream;

const MIN_DAYS_OF_COVER: u32 = 7;
const FALLBACK_RESERVED_SHARE: f64 = 0.02;

/// On-hand and reserved quantity of one product at the end of the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSnapshot {
    pub product_id: u32,
    pub as_of: NaiveDate,
    pub quantity_on_hand: f64,
    pub quantity_reserved: f64,
    pub last_updated: NaiveDateTime,
}

/// Derives a closing stock position from recent simulated sales.
pub struct StockPlanner<'a> {
    world: &'a WorldConfig,
}

impl<'a> StockPlanner<'a> {
    pub fn new(world: &'a WorldConfig) -> Self {
        Self { world }
    }

    /// One snapshot per simulated product, in catalog order.
    ///
    /// Draws happen for every catalog product so a product's snapshot does
    /// not depend on which other products were simulated.
    pub fn snapshot(&self, demand: &DemandSet) -> Vec<StockSnapshot> {
        let policy = &self.world.stock;
        let as_of = self.world.meta.end_date;
        let last_updated = as_of.and_time(NaiveTime::MIN) + Duration::hours(12);
        let mut rng = keyed_stream(self.world.meta.seed, "stock");

        let mut snapshots = Vec::with_capacity(demand.products.len());
        for product in &self.world.products {
            let noise = draw_noise(policy, &mut rng);
            let share = draw_reserved_share(policy, &mut rng);
            let Some(series) = demand.product(product.id) else {
                continue;
            };
            let daily = recent_average(series, policy.recent_days as usize);
            let on_hand = on_hand_quantity(product, policy, daily, noise);
            snapshots.push(StockSnapshot {
                product_id: product.id,
                as_of,
                quantity_on_hand: on_hand,
                quantity_reserved: reserved_quantity(product, on_hand, share),
                last_updated,
            });
        }
        snapshots
    }
}

fn draw_noise(policy: &StockPolicy, rng: &mut impl Rng) -> f64 {
    let half_width = policy.noise_pct.abs();
    1.0 + rng.random_range(-half_width..=half_width)
}

fn draw_reserved_share(policy: &StockPolicy, rng: &mut impl Rng) -> f64 {
    let low = policy.reserved_min_pct.min(policy.reserved_max_pct);
    let high = policy.reserved_min_pct.max(policy.reserved_max_pct);
    rng.random_range(low..=high)
}

/// Mean demand over the trailing `days` rows; zero for an empty series.
fn recent_average(series: &ProductSeries, days: usize) -> f64 {
    let skip = series.rows.len().saturating_sub(days);
    let recent = &series.rows[skip..];
    if recent.is_empty() {
        return 0.0;
    }
    recent.iter().map(|row| row.demand as f64).sum::<f64>() / recent.len() as f64
}

fn on_hand_quantity(product: &Product, policy: &StockPolicy, daily: f64, noise: f64) -> f64 {
    let cover = f64::from(policy.target_days_of_cover.max(MIN_DAYS_OF_COVER));
    let base = daily * cover + product.safety_stock;
    let raw = (base * noise).max(product.reorder_point);
    round_up_to_moq(product, raw, approx_moq(product))
}

fn reserved_quantity(product: &Product, on_hand: f64, share: f64) -> f64 {
    let reserved = round_qty(product, on_hand * share);
    if reserved > on_hand {
        round_qty(product, on_hand * FALLBACK_RESERVED_SHARE)
    } else {
        reserved
    }
}

/// Order multiple: one unit for countable goods, a tenth of the reorder
/// point otherwise with a 0.1 floor.
fn approx_moq(product: &Product) -> f64 {
    if product.is_countable() {
        1.0
    } else {
        round3(product.reorder_point / 10.0).max(0.1)
    }
}

fn round_qty(product: &Product, quantity: f64) -> f64 {
    if product.is_countable() {
        quantity.round().max(0.0)
    } else {
        round3(quantity).max(0.0)
    }
}

fn round_up_to_moq(product: &Product, quantity: f64, moq: f64) -> f64 {
    if moq <= 0.0 {
        return round_qty(product, quantity);
    }
    if product.is_countable() {
        let units = quantity.ceil().max(0.0);
        let step = moq.round().max(1.0);
        ((units / step).ceil().max(1.0)) * step
    } else {
        round3((quantity / moq).ceil() * moq)
    }
}
