use std::collections::BTreeMap;

use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};

use demandsim_config::WorldConfig;
use demandsim_core::{CampaignKind, DateWindow, Season};

use crate::engine::GenerationOutput;

/// One broken invariant found in generated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditViolation {
    pub code: String,
    pub message: String,
}

/// Violations found by [`audit_run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub violations: Vec<AuditViolation>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, code: &str) -> usize {
        self.violations
            .iter()
            .filter(|violation| violation.code == code)
            .count()
    }

    fn push(&mut self, code: &str, message: String) {
        self.violations.push(AuditViolation {
            code: code.to_string(),
            message,
        });
    }
}

/// Re-check the invariants of a finished run against its world.
pub fn audit_run(output: &GenerationOutput, world: &WorldConfig) -> AuditReport {
    let mut report = AuditReport::default();
    audit_calendar(output, world, &mut report);
    audit_campaigns(output, world, &mut report);
    audit_offers(output, world, &mut report);
    audit_demand(output, &mut report);
    audit_orders(output, &mut report);
    audit_stock(output, world, &mut report);
    report
}

fn audit_calendar(output: &GenerationOutput, world: &WorldConfig, report: &mut AuditReport) {
    let days = output.calendar.days();
    match (days.first(), days.last()) {
        (Some(first), Some(last)) => {
            if first.date != world.meta.start_date || last.date != world.meta.end_date {
                report.push(
                    "calendar_range",
                    format!(
                        "calendar covers {}..{}, world asks {}..{}",
                        first.date, last.date, world.meta.start_date, world.meta.end_date
                    ),
                );
            }
        }
        _ => report.push("calendar_range", "calendar is empty".to_string()),
    }

    for pair in days.windows(2) {
        if pair[1].date != pair[0].date + Duration::days(1) {
            report.push(
                "calendar_gap",
                format!("{} is not followed by the next day", pair[0].date),
            );
        }
    }

    for day in days {
        let weekday = day.date.weekday().num_days_from_monday();
        if day.weekday != weekday || day.is_weekend != (weekday >= 5) {
            report.push("calendar_weekday", format!("{} has wrong weekday flags", day.date));
        }
        if day.season != Season::from_month(day.date.month()) {
            report.push("calendar_season", format!("{} has wrong season", day.date));
        }
        if day.is_official_holiday == day.holiday_names.is_empty() {
            report.push(
                "calendar_holiday",
                format!("{} holiday flag disagrees with its names", day.date),
            );
        }
    }
}

fn audit_campaigns(output: &GenerationOutput, world: &WorldConfig, report: &mut AuditReport) {
    let range = output.calendar.range();
    let policy = &world.campaigns;
    let countable: BTreeMap<u32, bool> = world
        .products
        .iter()
        .map(|product| (product.id, product.is_countable()))
        .collect();

    let mut by_product: BTreeMap<u32, Vec<DateWindow>> = BTreeMap::new();
    for campaign in &output.campaigns {
        check_window(
            report,
            "campaign",
            campaign.id,
            campaign.window,
            range,
            policy.min_days,
            policy.max_days,
        );
        match campaign.kind {
            CampaignKind::Discount { percent } => {
                if !(10..=30).contains(&percent) {
                    report.push(
                        "campaign_percent",
                        format!("campaign {} discount {percent}% outside [10, 30]", campaign.id),
                    );
                }
            }
            CampaignKind::BuyXGetY { buy, get } => {
                if !matches!((buy, get), (2, 1) | (3, 1)) {
                    report.push(
                        "campaign_bundle",
                        format!("campaign {} has bundle ratio {buy}+{get}", campaign.id),
                    );
                }
                if !countable.get(&campaign.product_id).copied().unwrap_or(false) {
                    report.push(
                        "campaign_bundle_uom",
                        format!(
                            "campaign {} bundles product {} without a countable unit",
                            campaign.id, campaign.product_id
                        ),
                    );
                }
            }
        }
        by_product
            .entry(campaign.product_id)
            .or_default()
            .push(campaign.window);
    }
    check_disjoint(report, "campaign_overlap", "product", &by_product);
    check_increasing(
        report,
        "campaign_ids",
        output.campaigns.iter().map(|campaign| campaign.id),
    );

    for (campaign, assignment) in output.campaigns.iter().zip(&output.assignments) {
        if campaign.id != assignment.campaign_id || campaign.product_id != assignment.product_id {
            report.push(
                "campaign_assignment",
                format!("campaign {} has a mismatched assignment", campaign.id),
            );
        }
    }
    if output.campaigns.len() != output.assignments.len() {
        report.push(
            "campaign_assignment",
            "campaign and assignment counts differ".to_string(),
        );
    }
}

fn audit_offers(output: &GenerationOutput, world: &WorldConfig, report: &mut AuditReport) {
    let range = output.calendar.range();
    let policy = &world.offers;
    let mut by_customer: BTreeMap<u32, Vec<DateWindow>> = BTreeMap::new();
    for offer in &output.offers {
        check_window(
            report,
            "offer",
            offer.id,
            offer.window,
            range,
            policy.min_days,
            policy.max_days,
        );
        if !(5.0..=15.0).contains(&offer.percent_off) || offer.percent_off.fract() != 0.0 {
            report.push(
                "offer_percent",
                format!(
                    "offer {} percent {} is not a whole number in [5, 15]",
                    offer.id, offer.percent_off
                ),
            );
        }
        by_customer
            .entry(offer.customer_id)
            .or_default()
            .push(offer.window);
    }
    check_disjoint(report, "offer_overlap", "customer", &by_customer);
    check_increasing(report, "offer_ids", output.offers.iter().map(|offer| offer.id));
}

fn audit_demand(output: &GenerationOutput, report: &mut AuditReport) {
    let days = output.calendar.days();
    for series in &output.demand.products {
        if series.rows.len() != days.len() {
            report.push(
                "demand_rows",
                format!(
                    "product {} has {} rows for {} days",
                    series.product_id,
                    series.rows.len(),
                    days.len()
                ),
            );
            continue;
        }
        for (row, day) in series.rows.iter().zip(days) {
            if row.date != day.date || row.product_id != series.product_id {
                report.push(
                    "demand_order",
                    format!("product {} row for {} is out of order", series.product_id, row.date),
                );
                break;
            }
        }
    }
}

fn audit_orders(output: &GenerationOutput, report: &mut AuditReport) {
    let Some(book) = &output.orders else {
        return;
    };
    check_increasing(report, "order_ids", book.orders.iter().map(|order| order.id));
    check_increasing(report, "order_line_ids", book.lines.iter().map(|line| line.id));

    if book.unallocated_units > 0.0 {
        return;
    }
    let allocated = book.units_by_day();
    for series in &output.demand.products {
        for row in &series.rows {
            let units = allocated
                .get(&(row.date, row.product_id))
                .copied()
                .unwrap_or(0.0);
            if (units - row.demand as f64).abs() > 1e-6 {
                report.push(
                    "order_conservation",
                    format!(
                        "product {} on {} ordered {units} of {} demanded",
                        row.product_id, row.date, row.demand
                    ),
                );
            }
        }
    }
}

fn audit_stock(output: &GenerationOutput, world: &WorldConfig, report: &mut AuditReport) {
    let Some(snapshots) = &output.stock else {
        return;
    };
    if snapshots.len() != output.demand.products.len() {
        report.push(
            "stock_coverage",
            format!(
                "{} stock snapshots for {} simulated products",
                snapshots.len(),
                output.demand.products.len()
            ),
        );
    }
    for snapshot in snapshots {
        let Some(product) = world
            .products
            .iter()
            .find(|product| product.id == snapshot.product_id)
        else {
            report.push(
                "stock_product",
                format!("stock snapshot for unknown product {}", snapshot.product_id),
            );
            continue;
        };
        let (on_hand, reserved) = (snapshot.quantity_on_hand, snapshot.quantity_reserved);
        if on_hand < product.reorder_point {
            report.push(
                "stock_below_reorder",
                format!(
                    "product {} holds {on_hand} below reorder point {}",
                    product.id, product.reorder_point
                ),
            );
        }
        if !(0.0..=on_hand).contains(&reserved) {
            report.push(
                "stock_reserved",
                format!("product {} reserves {reserved} of {on_hand}", product.id),
            );
        }
        if product.is_countable() && (on_hand.fract() != 0.0 || reserved.fract() != 0.0) {
            report.push(
                "stock_fractional",
                format!("countable product {} has fractional stock", product.id),
            );
        }
    }
}

fn check_window(
    report: &mut AuditReport,
    kind: &str,
    id: u32,
    window: DateWindow,
    range: DateWindow,
    min_days: u32,
    max_days: u32,
) {
    let len = window.len_days();
    if len < i64::from(min_days) || len > i64::from(max_days) {
        report.push(
            &format!("{kind}_length"),
            format!("{kind} {id} lasts {len} days, allowed [{min_days}, {max_days}]"),
        );
    }
    if window.start < range.start || window.end > range.end {
        report.push(
            &format!("{kind}_range"),
            format!("{kind} {id} window {}..{} leaves the range", window.start, window.end),
        );
    }
}

fn check_disjoint(
    report: &mut AuditReport,
    code: &str,
    owner: &str,
    windows: &BTreeMap<u32, Vec<DateWindow>>,
) {
    for (id, list) in windows {
        let mut sorted = list.clone();
        sorted.sort();
        if sorted.windows(2).any(|pair| pair[0].overlaps(&pair[1])) {
            report.push(code, format!("{owner} {id} has overlapping windows"));
        }
    }
}

fn check_increasing(report: &mut AuditReport, code: &str, ids: impl Iterator<Item = u32>) {
    let mut previous: Option<u32> = None;
    for id in ids {
        if previous.is_some_and(|prev| id <= prev) {
            report.push(code, format!("id {id} does not increase"));
            return;
        }
        previous = Some(id);
    }
}
