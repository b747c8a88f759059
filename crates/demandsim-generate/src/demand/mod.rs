//! Daily demand simulation per product.
//!
//! Each product is simulated independently: expected means from the calendar
//! and promotions, EMA smoothing, an AR(1) latent factor, negative-binomial
//! sampling, then the quiet-day clamp. A product's stream is seeded from the
//! master seed and its id, so subsets and orderings give identical rows.

pub mod clamp;
pub mod latent;
pub mod mean;
pub mod sampling;

use serde::Serialize;
use tracing::debug;

use demandsim_config::WorldConfig;
use demandsim_core::{Campaign, CustomerOffer, DailyDemandObservation, round2};

use crate::calendar::Calendar;
use crate::campaigns::{CampaignIndex, OfferIndex};
use crate::seed::product_stream;

use self::clamp::QuietDayClamp;
use self::latent::{ar1, ema};
use self::mean::{CivicDayDetector, expected_mean, offer_pressure_by_day};
use self::sampling::{effective_dispersion, sample_negative_binomial};

/// Demand rows of one product in date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSeries {
    pub product_id: u32,
    pub rows: Vec<DailyDemandObservation>,
    /// Days where the quiet-day clamp changed the sample.
    pub clamped_days: usize,
}

impl ProductSeries {
    pub fn total_demand(&self) -> u64 {
        self.rows.iter().map(|row| row.demand).sum()
    }
}

/// Demand of every simulated product, in simulation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemandSet {
    pub products: Vec<ProductSeries>,
}

impl DemandSet {
    pub fn product(&self, product_id: u32) -> Option<&ProductSeries> {
        self.products
            .iter()
            .find(|series| series.product_id == product_id)
    }

    /// All rows concatenated product by product.
    pub fn combined(&self) -> Vec<DailyDemandObservation> {
        self.products
            .iter()
            .flat_map(|series| series.rows.iter().cloned())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.products.iter().map(|series| series.rows.len()).sum()
    }

    pub fn total_demand(&self) -> u64 {
        self.products.iter().map(ProductSeries::total_demand).sum()
    }

    pub fn clamped_days(&self) -> usize {
        self.products.iter().map(|series| series.clamped_days).sum()
    }
}

pub struct DemandSimulator<'a> {
    world: &'a WorldConfig,
    calendar: &'a Calendar,
    campaigns: CampaignIndex<'a>,
    offer_pressure: Vec<f64>,
    civic: CivicDayDetector,
}

impl<'a> DemandSimulator<'a> {
    pub fn new(
        world: &'a WorldConfig,
        calendar: &'a Calendar,
        campaigns: &'a [Campaign],
        offers: &'a [CustomerOffer],
    ) -> Self {
        let offer_pressure = offer_pressure_by_day(world, calendar, &OfferIndex::new(offers));
        Self {
            world,
            calendar,
            campaigns: CampaignIndex::new(campaigns),
            offer_pressure,
            civic: CivicDayDetector::default(),
        }
    }

    pub fn with_civic_detector(mut self, civic: CivicDayDetector) -> Self {
        self.civic = civic;
        self
    }

    /// Effective offer pressure percent per calendar day.
    pub fn offer_pressure(&self) -> &[f64] {
        &self.offer_pressure
    }

    pub fn simulate(&self, product_ids: &[u32]) -> DemandSet {
        DemandSet {
            products: product_ids
                .iter()
                .map(|product_id| self.simulate_product(*product_id))
                .collect(),
        }
    }

    pub fn simulate_product(&self, product_id: u32) -> ProductSeries {
        let tuning = &self.world.tuning;
        let profile = self.world.profile_for(product_id);
        let days = self.calendar.days();

        let mut promo_pcts = Vec::with_capacity(days.len());
        let mut means = Vec::with_capacity(days.len());
        for (idx, day) in days.iter().enumerate() {
            let campaign_pct = self.campaigns.active_percent(product_id, day.date);
            let offer_pct = self.offer_pressure.get(idx).copied().unwrap_or(0.0);
            means.push(expected_mean(
                &profile,
                day,
                campaign_pct,
                offer_pct,
                tuning,
                &self.civic,
            ));
            promo_pcts.push(round2(campaign_pct));
        }

        let smoothed = if tuning.smooth_alpha > 0.0 && tuning.smooth_alpha < 1.0 {
            ema(&means, tuning.smooth_alpha)
        } else {
            means
        };

        let mut rng = product_stream(self.world.meta.seed, product_id);
        let latent = ar1(
            smoothed.len(),
            tuning.latent_rho,
            tuning.latent_sigma,
            &mut rng,
        );
        let dispersion = effective_dispersion(profile.dispersion, tuning.dispersion_scale);
        let clamp = QuietDayClamp::new(&self.world.clamp, tuning.demand_scale);

        let mut rows = Vec::with_capacity(days.len());
        let mut clamped_days = 0;
        for (idx, day) in days.iter().enumerate() {
            let mean = smoothed[idx] * (profile.latent_amp * latent[idx]).exp() * tuning.demand_scale;
            let mut demand = sample_negative_binomial(mean, dispersion, &mut rng);

            let offer_pct = self.offer_pressure.get(idx).copied().unwrap_or(0.0);
            if clamp.is_enabled() && clamp.is_quiet(promo_pcts[idx], offer_pct, day) {
                if let Some(reference) = clamp.reference(&smoothed, days, idx) {
                    let shrunk = clamp.apply(demand, reference);
                    if shrunk != demand {
                        clamped_days += 1;
                    }
                    demand = shrunk;
                }
            }

            rows.push(DailyDemandObservation {
                date: day.date,
                product_id,
                demand,
                promo_pct: promo_pcts[idx],
            });
        }

        let series = ProductSeries {
            product_id,
            rows,
            clamped_days,
        };
        debug!(
            product_id,
            days = series.rows.len(),
            total_demand = series.total_demand(),
            clamped_days,
            "product demand simulated"
        );
        series
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use demandsim_config::ProductProfileEntry;
    use demandsim_core::{CampaignKind, DateWindow, ProductDemandProfile};

    use super::*;
    use crate::calendar::CalendarBuilder;
    use crate::holidays::StaticHolidays;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn fixture(start: NaiveDate, end: NaiveDate) -> (WorldConfig, Calendar) {
        let mut world = WorldConfig::new(start, end, "XX", 42);
        world.profiles.push(ProductProfileEntry {
            product_id: 1,
            profile: ProductDemandProfile::flat(5.0),
        });
        let provider = StaticHolidays::new("XX");
        let calendar = CalendarBuilder::new(&provider)
            .build(start, end)
            .expect("calendar");
        (world, calendar)
    }

    #[test]
    fn one_row_per_day_in_order() {
        let (world, calendar) = fixture(date(2024, 1, 1), date(2024, 3, 31));
        let simulator = DemandSimulator::new(&world, &calendar, &[], &[]);
        let series = simulator.simulate_product(1);
        assert_eq!(series.rows.len(), calendar.len());
        assert!(series.rows.windows(2).all(|pair| pair[0].date < pair[1].date));
        assert!(series.rows.iter().all(|row| row.promo_pct == 0.0));
    }

    #[test]
    fn products_are_independent_of_order() {
        let (world, calendar) = fixture(date(2024, 1, 1), date(2024, 2, 29));
        let simulator = DemandSimulator::new(&world, &calendar, &[], &[]);
        let both = simulator.simulate(&[1, 2]);
        let reversed = simulator.simulate(&[2, 1]);
        let alone = simulator.simulate_product(2);
        assert_eq!(both.product(2), Some(&alone));
        assert_eq!(reversed.product(1), both.product(1));
        assert_eq!(both.combined().len(), both.row_count());
    }

    #[test]
    fn campaign_days_report_promo_percent() {
        let (world, calendar) = fixture(date(2024, 1, 1), date(2024, 1, 31));
        let campaigns = vec![Campaign {
            id: 20001,
            name: "Sample B2G1".to_string(),
            product_id: 1,
            kind: CampaignKind::BuyXGetY { buy: 2, get: 1 },
            window: DateWindow {
                start: date(2024, 1, 10),
                end: date(2024, 1, 16),
            },
        }];
        let simulator = DemandSimulator::new(&world, &calendar, &campaigns, &[]);
        let series = simulator.simulate_product(1);
        let promo: Vec<f64> = series.rows.iter().map(|row| row.promo_pct).collect();
        assert_eq!(promo[8], 0.0);
        assert_eq!(promo[9], 33.33);
        assert_eq!(promo[15], 33.33);
        assert_eq!(promo[16], 0.0);
    }

    #[test]
    fn zero_base_rate_yields_zero_demand() {
        let (mut world, calendar) = fixture(date(2024, 1, 1), date(2024, 1, 31));
        world.profiles[0].profile = ProductDemandProfile::flat(0.0);
        let simulator = DemandSimulator::new(&world, &calendar, &[], &[]);
        assert_eq!(simulator.simulate_product(1).total_demand(), 0);
    }
}
