use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::Rng;
use tracing::debug;

use demandsim_config::WorldConfig;
use demandsim_core::{
    Campaign, CampaignAssignment, CampaignKind, CustomerOffer, DateWindow, Product, round2,
};

use crate::errors::GenerationError;
use crate::scheduler::{IntervalScheduler, Placement};
use crate::seed::keyed_stream;

pub const CAMPAIGN_ID_BASE: u32 = 20001;
pub const OFFER_ID_BASE: u32 = 30001;

/// Monotonic id counter owned by one generation run.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new(base: u32) -> Self {
        Self { next: base }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Number of occurrences over the horizon: `round(rate * years + U(-0.5, 0.5))`,
/// floored at `min`.
pub fn occurrence_count(rng: &mut impl Rng, per_year: f64, years: f64, min: i64) -> usize {
    let jitter = rng.random_range(-0.5..=0.5);
    let count = (per_year * years + jitter).round() as i64;
    count.max(min).max(0) as usize
}

#[derive(Debug, Clone, Default)]
pub struct CampaignSet {
    pub campaigns: Vec<Campaign>,
    pub assignments: Vec<CampaignAssignment>,
    /// Campaign occurrences dropped because no window could be placed.
    pub exhausted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OfferSet {
    pub offers: Vec<CustomerOffer>,
    pub exhausted: usize,
}

/// Schedules product campaigns and customer offers over the world range.
pub struct CampaignGenerator<'a> {
    world: &'a WorldConfig,
    range: DateWindow,
}

impl<'a> CampaignGenerator<'a> {
    pub fn new(world: &'a WorldConfig, range: DateWindow) -> Self {
        Self { world, range }
    }

    pub fn generate_campaigns(&self) -> Result<CampaignSet, GenerationError> {
        let policy = &self.world.campaigns;
        let scheduler = IntervalScheduler::new(self.range, policy.min_days, policy.max_days)?
            .with_max_attempts(policy.max_attempts)
            .with_bias_probability(policy.bias_probability);
        let years = horizon_years(self.range);

        let mut ids = IdAllocator::new(CAMPAIGN_ID_BASE);
        let mut set = CampaignSet::default();

        for product in &self.world.products {
            let mut rng = keyed_stream(self.world.meta.seed, &format!("campaigns:{}", product.id));
            let count = occurrence_count(&mut rng, policy.per_year, years, 1);
            let off_peak = self.world.peak_seasons.off_peak_months(product);
            let mut taken: Vec<DateWindow> = Vec::with_capacity(count);

            for _ in 0..count {
                let bundle = product.is_countable() && rng.random::<f64>() >= 0.6;
                let window = match scheduler.place(&mut rng, &taken, off_peak.as_deref()) {
                    Placement::Placed(window) => window,
                    Placement::Exhausted { attempts } => {
                        debug!(product_id = product.id, attempts, "campaign placement exhausted");
                        set.exhausted += 1;
                        continue;
                    }
                };
                let kind = if bundle {
                    let (buy, get) = if rng.random::<f64>() < 0.7 { (2, 1) } else { (3, 1) };
                    CampaignKind::BuyXGetY { buy, get }
                } else {
                    CampaignKind::Discount {
                        percent: rng.random_range(10..=30),
                    }
                };

                let id = ids.next_id();
                set.campaigns.push(Campaign {
                    id,
                    name: campaign_name(product, &kind),
                    product_id: product.id,
                    kind,
                    window,
                });
                set.assignments.push(CampaignAssignment {
                    campaign_id: id,
                    product_id: product.id,
                });
                taken.push(window);
            }
        }

        Ok(set)
    }

    pub fn generate_offers(&self) -> Result<OfferSet, GenerationError> {
        let policy = &self.world.offers;
        let scheduler = IntervalScheduler::new(self.range, policy.min_days, policy.max_days)?
            .with_max_attempts(policy.max_attempts);
        let years = horizon_years(self.range);

        let mut ids = IdAllocator::new(OFFER_ID_BASE);
        let mut set = OfferSet::default();

        for customer in &self.world.customers {
            let mut rng = keyed_stream(self.world.meta.seed, &format!("offers:{}", customer.id));
            let count = occurrence_count(&mut rng, policy.per_year, years, 0);
            let mut taken: Vec<DateWindow> = Vec::with_capacity(count);

            for _ in 0..count {
                let window = match scheduler.place(&mut rng, &taken, None) {
                    Placement::Placed(window) => window,
                    Placement::Exhausted { attempts } => {
                        debug!(customer_id = customer.id, attempts, "offer placement exhausted");
                        set.exhausted += 1;
                        continue;
                    }
                };
                let percent_off = round2(rng.random_range(5.0..=15.0)).trunc();
                set.offers.push(CustomerOffer {
                    id: ids.next_id(),
                    customer_id: customer.id,
                    percent_off,
                    window,
                });
                taken.push(window);
            }
        }

        Ok(set)
    }
}

fn horizon_years(range: DateWindow) -> f64 {
    (range.end - range.start).num_days() as f64 / 365.25
}

fn campaign_name(product: &Product, kind: &CampaignKind) -> String {
    match kind {
        CampaignKind::Discount { percent } => format!("{} {percent}% OFF", product.name),
        CampaignKind::BuyXGetY { buy, get } => format!("{} B{buy}G{get}", product.name),
    }
}

/// Campaigns grouped by product for per-day lookups.
#[derive(Debug, Default)]
pub struct CampaignIndex<'a> {
    by_product: BTreeMap<u32, Vec<&'a Campaign>>,
}

impl<'a> CampaignIndex<'a> {
    pub fn new(campaigns: &'a [Campaign]) -> Self {
        let mut by_product: BTreeMap<u32, Vec<&'a Campaign>> = BTreeMap::new();
        for campaign in campaigns {
            by_product.entry(campaign.product_id).or_default().push(campaign);
        }
        Self { by_product }
    }

    /// Active campaign with the highest percent-off equivalent.
    pub fn best_active(&self, product_id: u32, date: NaiveDate) -> Option<&'a Campaign> {
        self.by_product
            .get(&product_id)?
            .iter()
            .copied()
            .filter(|campaign| campaign.is_active(date))
            .max_by(|a, b| {
                a.kind
                    .equivalent_percent()
                    .total_cmp(&b.kind.equivalent_percent())
            })
    }

    /// Percent-off equivalent of the strongest active campaign, or 0.
    pub fn active_percent(&self, product_id: u32, date: NaiveDate) -> f64 {
        self.best_active(product_id, date)
            .map(|campaign| campaign.kind.equivalent_percent())
            .unwrap_or(0.0)
    }
}

/// Offers grouped by customer for per-day lookups.
#[derive(Debug, Default)]
pub struct OfferIndex<'a> {
    by_customer: BTreeMap<u32, Vec<&'a CustomerOffer>>,
}

impl<'a> OfferIndex<'a> {
    pub fn new(offers: &'a [CustomerOffer]) -> Self {
        let mut by_customer: BTreeMap<u32, Vec<&'a CustomerOffer>> = BTreeMap::new();
        for offer in offers {
            by_customer.entry(offer.customer_id).or_default().push(offer);
        }
        Self { by_customer }
    }

    pub fn active(&self, customer_id: u32, date: NaiveDate) -> Option<&'a CustomerOffer> {
        self.by_customer
            .get(&customer_id)?
            .iter()
            .copied()
            .filter(|offer| offer.is_active(date))
            .max_by(|a, b| a.percent_off.total_cmp(&b.percent_off))
    }

    /// Personal percent-off active for the customer, or 0.
    pub fn active_percent(&self, customer_id: u32, date: NaiveDate) -> f64 {
        self.active(customer_id, date)
            .map(|offer| offer.percent_off)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn campaign(id: u32, product_id: u32, kind: CampaignKind, start: NaiveDate, end: NaiveDate) -> Campaign {
        Campaign {
            id,
            name: format!("c{id}"),
            product_id,
            kind,
            window: DateWindow { start, end },
        }
    }

    #[test]
    fn allocator_is_monotonic() {
        let mut ids = IdAllocator::new(CAMPAIGN_ID_BASE);
        assert_eq!(ids.next_id(), 20001);
        assert_eq!(ids.next_id(), 20002);
        assert_eq!(ids.next_id(), 20003);
    }

    #[test]
    fn occurrence_count_honors_floor() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            assert!(occurrence_count(&mut rng, 3.0, 0.0, 1) >= 1);
        }
        let two_years = occurrence_count(&mut rng, 3.0, 2.0, 1);
        assert!((5..=7).contains(&two_years));
    }

    #[test]
    fn strongest_active_campaign_wins() {
        let campaigns = vec![
            campaign(
                1,
                7,
                CampaignKind::Discount { percent: 10 },
                date(2024, 1, 1),
                date(2024, 1, 10),
            ),
            campaign(
                2,
                7,
                CampaignKind::BuyXGetY { buy: 2, get: 1 },
                date(2024, 1, 5),
                date(2024, 1, 15),
            ),
        ];
        let index = CampaignIndex::new(&campaigns);
        assert_eq!(index.active_percent(7, date(2024, 1, 2)), 10.0);
        assert_eq!(index.best_active(7, date(2024, 1, 6)).map(|c| c.id), Some(2));
        assert_eq!(index.active_percent(7, date(2024, 1, 20)), 0.0);
        assert_eq!(index.active_percent(8, date(2024, 1, 6)), 0.0);
    }

    #[test]
    fn offers_lookup_by_customer_and_day() {
        let offers = vec![CustomerOffer {
            id: 30001,
            customer_id: 3,
            percent_off: 12.5,
            window: DateWindow {
                start: date(2024, 2, 1),
                end: date(2024, 2, 7),
            },
        }];
        let index = OfferIndex::new(&offers);
        assert_eq!(index.active_percent(3, date(2024, 2, 7)), 12.5);
        assert_eq!(index.active_percent(3, date(2024, 2, 8)), 0.0);
        assert!(index.active(4, date(2024, 2, 3)).is_none());
    }

    #[test]
    fn offer_percents_are_whole_numbers() {
        let mut world = WorldConfig::new(date(2023, 1, 1), date(2024, 12, 31), "TR", 42);
        world.offers.per_year = 3.0;
        world.customers = (1..=20)
            .map(|id| demandsim_core::Customer {
                id,
                name: format!("Customer {id}"),
                segment: "retail".to_string(),
            })
            .collect();
        let range = DateWindow {
            start: world.meta.start_date,
            end: world.meta.end_date,
        };

        let set = CampaignGenerator::new(&world, range)
            .generate_offers()
            .expect("generate offers");
        assert!(!set.offers.is_empty());
        for offer in &set.offers {
            assert_eq!(offer.percent_off.fract(), 0.0, "offer {}", offer.id);
            assert!((5.0..=15.0).contains(&offer.percent_off));
        }
    }
}
