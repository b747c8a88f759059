use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use demandsim_config::{OrderPolicy, WorldConfig};
use demandsim_core::{Campaign, CustomerOffer, Product, round2, round3, stack_discounts};

use crate::calendar::Calendar;
use crate::campaigns::{CampaignIndex, IdAllocator, OfferIndex};
use crate::demand::DemandSet;
use crate::seed::keyed_stream;

pub const ORDER_ID_BASE: u32 = 60001;
pub const ORDER_LINE_ID_BASE: u32 = 80001;

const MAX_BASKET_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesOrder {
    pub id: u32,
    pub customer_id: u32,
    pub order_date: NaiveDate,
    pub special_offer_id: Option<u32>,
    /// Personal percent-off applied to the whole order, if any.
    pub customer_discount_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesOrderLine {
    pub id: u32,
    pub order_id: u32,
    pub product_id: u32,
    pub quantity: f64,
    pub unit_price: f64,
    /// Campaign and personal discounts stacked multiplicatively.
    pub discount_pct: f64,
    pub campaign_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderBook {
    pub orders: Vec<SalesOrder>,
    pub lines: Vec<SalesOrderLine>,
    /// Demand left unallocated on days without any customer.
    pub unallocated_units: f64,
}

impl OrderBook {
    /// Ordered units per (order date, product).
    pub fn units_by_day(&self) -> BTreeMap<(NaiveDate, u32), f64> {
        let dates: BTreeMap<u32, NaiveDate> = self
            .orders
            .iter()
            .map(|order| (order.id, order.order_date))
            .collect();
        let mut units = BTreeMap::new();
        for line in &self.lines {
            if let Some(date) = dates.get(&line.order_id) {
                *units.entry((*date, line.product_id)).or_insert(0.0) += line.quantity;
            }
        }
        units
    }
}

/// Turns daily demand into sales orders spread across customers.
pub struct OrderAllocator<'a> {
    world: &'a WorldConfig,
    calendar: &'a Calendar,
    campaigns: CampaignIndex<'a>,
    offers: OfferIndex<'a>,
}

impl<'a> OrderAllocator<'a> {
    pub fn new(
        world: &'a WorldConfig,
        calendar: &'a Calendar,
        campaigns: &'a [Campaign],
        offers: &'a [CustomerOffer],
    ) -> Self {
        Self {
            world,
            calendar,
            campaigns: CampaignIndex::new(campaigns),
            offers: OfferIndex::new(offers),
        }
    }

    pub fn allocate(&self, demand: &DemandSet) -> OrderBook {
        let policy = &self.world.orders;
        let products: BTreeMap<u32, &Product> = self
            .world
            .products
            .iter()
            .map(|product| (product.id, product))
            .collect();

        let mut rng = keyed_stream(self.world.meta.seed, "orders");
        let mut order_ids = IdAllocator::new(ORDER_ID_BASE);
        let mut line_ids = IdAllocator::new(ORDER_LINE_ID_BASE);
        let mut book = OrderBook::default();

        for day in self.calendar.days() {
            let weights = self.customer_weights(day.date, day.is_weekend);
            let mass = weights_only(&weights);

            let mut allocations: BTreeMap<(u32, u32), f64> = BTreeMap::new();
            for series in &demand.products {
                let Some(product) = products.get(&series.product_id) else {
                    continue;
                };
                let Ok(pos) = series.rows.binary_search_by_key(&day.date, |row| row.date) else {
                    continue;
                };
                let mut remaining = series.rows[pos].demand as f64;
                if remaining <= 0.0 {
                    continue;
                }
                if weights.is_empty() {
                    book.unallocated_units += remaining;
                    continue;
                }
                while remaining > 1e-9 {
                    let customer_id = weights[pick_weighted(&mass, rng.random())].0;
                    let quantity = pick_quantity(product, policy, &mut rng).min(remaining);
                    *allocations.entry((customer_id, product.id)).or_insert(0.0) += quantity;
                    remaining -= quantity;
                }
            }

            let customers: BTreeSet<u32> = allocations.keys().map(|(cid, _)| *cid).collect();
            for customer_id in customers {
                let mut basket: BTreeMap<u32, f64> = allocations
                    .iter()
                    .filter(|((cid, _), _)| *cid == customer_id)
                    .map(|((_, pid), qty)| (*pid, *qty))
                    .collect();
                let offer = self.offers.active(customer_id, day.date);
                let customer_pct = offer.map(|offer| offer.percent_off).unwrap_or(0.0);

                while !basket.is_empty() {
                    let order_id = order_ids.next_id();
                    book.orders.push(SalesOrder {
                        id: order_id,
                        customer_id,
                        order_date: day.date,
                        special_offer_id: offer.map(|offer| offer.id),
                        customer_discount_pct: (customer_pct > 0.0).then(|| round2(customer_pct)),
                    });

                    let size = basket_size(policy, &mut rng).min(basket.len());
                    let mut candidates: Vec<u32> = basket.keys().copied().collect();
                    candidates.shuffle(&mut rng);
                    for product_id in candidates.into_iter().take(size) {
                        let Some(quantity) = basket.remove(&product_id) else {
                            continue;
                        };
                        let campaign = self.campaigns.best_active(product_id, day.date);
                        let campaign_pct = campaign
                            .map(|campaign| campaign.kind.equivalent_percent())
                            .unwrap_or(0.0);
                        book.lines.push(SalesOrderLine {
                            id: line_ids.next_id(),
                            order_id,
                            product_id,
                            quantity: round3(quantity),
                            unit_price: products.get(&product_id).map(|p| p.price).unwrap_or(0.0),
                            discount_pct: stack_discounts(campaign_pct, customer_pct),
                            campaign_id: campaign.map(|campaign| campaign.id),
                        });
                    }
                }
            }
        }

        book
    }

    /// Normalized customer weights for a day; uniform when all are zero.
    fn customer_weights(&self, date: NaiveDate, is_weekend: bool) -> Vec<(u32, f64)> {
        let alpha = self.world.orders.offer_uplift_alpha;
        let mut weights: Vec<(u32, f64)> = self
            .world
            .customers
            .iter()
            .map(|customer| {
                let base = self.world.segment(&customer.segment).weight(is_weekend);
                let offer_pct = self.offers.active_percent(customer.id, date);
                (customer.id, (base * (1.0 + alpha * offer_pct / 100.0)).max(0.0))
            })
            .collect();
        let total: f64 = weights.iter().map(|(_, weight)| weight).sum();
        if total > 0.0 {
            for (_, weight) in &mut weights {
                *weight /= total;
            }
        } else if !weights.is_empty() {
            let uniform = 1.0 / weights.len() as f64;
            for (_, weight) in &mut weights {
                *weight = uniform;
            }
        }
        weights
    }
}

fn weights_only(weights: &[(u32, f64)]) -> Vec<f64> {
    weights.iter().map(|(_, weight)| *weight).collect()
}

/// Index of the first cumulative weight reaching `draw`; the last index
/// absorbs rounding.
fn pick_weighted(weights: &[f64], draw: f64) -> usize {
    let total: f64 = weights.iter().sum();
    let target = if total > 0.0 { draw * total } else { draw };
    let mut acc = 0.0;
    for (idx, weight) in weights.iter().enumerate() {
        acc += weight;
        if target <= acc {
            return idx;
        }
    }
    weights.len().saturating_sub(1)
}

fn pick_quantity(product: &Product, policy: &OrderPolicy, rng: &mut impl Rng) -> f64 {
    if product.is_countable() {
        (pick_weighted(&policy.countable_qty_probs, rng.random()) + 1) as f64
    } else {
        policy.noncountable_default_qty
    }
}

fn basket_size(policy: &OrderPolicy, rng: &mut impl Rng) -> usize {
    (pick_weighted(&policy.basket_size_probs, rng.random()) + 1).clamp(1, MAX_BASKET_LINES)
}
