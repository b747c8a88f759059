use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use demandsim_config::{ConfigError, WorldConfig, validate_world_config};
use demandsim_core::{Campaign, CampaignAssignment, CustomerOffer};

use crate::calendar::{Calendar, CalendarBuilder};
use crate::campaigns::CampaignGenerator;
use crate::checks::audit_run;
use crate::demand::{DemandSet, DemandSimulator};
use crate::errors::GenerationError;
use crate::holidays::{HolidayProvider, provider_for_country};
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport};
use crate::orders::{OrderAllocator, OrderBook};
use crate::stock::{StockPlanner, StockSnapshot};

/// Everything produced by one generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub calendar: Calendar,
    pub campaigns: Vec<Campaign>,
    pub assignments: Vec<CampaignAssignment>,
    pub offers: Vec<CustomerOffer>,
    pub demand: DemandSet,
    pub orders: Option<OrderBook>,
    pub stock: Option<Vec<StockSnapshot>>,
    pub report: GenerationReport,
}

/// Entry point for generating a demand dataset from a world definition.
#[derive(Clone, Default)]
pub struct GenerationEngine {
    options: GenerateOptions,
    provider: Option<Arc<dyn HolidayProvider>>,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            provider: None,
        }
    }

    /// Use this provider instead of resolving one from the world's country.
    pub fn with_holiday_provider(mut self, provider: Arc<dyn HolidayProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn run(&self, world: &WorldConfig) -> Result<GenerationOutput, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let meta = &world.meta;

        info!(
            run_id = %run_id,
            world = %meta.name,
            country = %meta.country,
            seed = meta.seed,
            start_date = %meta.start_date,
            end_date = %meta.end_date,
            "generation started"
        );

        let validation = validate_world_config(world);
        if !validation.is_ok() {
            warn!(
                run_id = %run_id,
                errors = validation.errors.len(),
                "world configuration rejected"
            );
            return Err(ConfigError::Invalid(validation).into());
        }

        let mut report = GenerationReport::new(run_id.clone(), &meta.name, &meta.country, meta.seed);
        for issue in &validation.warnings {
            report.record_warning(GenerationIssue::from(issue));
        }

        let resolved;
        let provider: &dyn HolidayProvider = match &self.provider {
            Some(provider) => provider.as_ref(),
            None => {
                resolved = provider_for_country(&meta.country)
                    .ok_or_else(|| GenerationError::UnknownCountry(meta.country.clone()))?;
                resolved.as_ref()
            }
        };

        let calendar = CalendarBuilder::new(provider).build(meta.start_date, meta.end_date)?;
        for missing in calendar.missing_feasts() {
            warn!(
                run_id = %run_id,
                year = missing.year,
                feast = missing.feast.as_str(),
                "feast not found in holiday table"
            );
            report.record_warning(
                GenerationIssue::warning(
                    "feast_not_found",
                    format!(
                        "no {} found for {}; feast and fasting flags left unset",
                        missing.feast.as_str(),
                        missing.year
                    ),
                )
                .with_year(missing.year),
            );
        }

        let generator = CampaignGenerator::new(world, calendar.range());
        let campaign_set = generator.generate_campaigns()?;
        let offer_set = generator.generate_offers()?;
        debug!(
            run_id = %run_id,
            campaigns = campaign_set.campaigns.len(),
            campaigns_exhausted = campaign_set.exhausted,
            offers = offer_set.offers.len(),
            offers_exhausted = offer_set.exhausted,
            "promotions generated"
        );

        let product_ids = self.selected_products(world)?;
        let demand = DemandSimulator::new(
            world,
            &calendar,
            &campaign_set.campaigns,
            &offer_set.offers,
        )
        .simulate(&product_ids);

        let include_orders = self.options.include_orders.unwrap_or(world.orders.enabled);
        let orders = include_orders.then(|| {
            OrderAllocator::new(world, &calendar, &campaign_set.campaigns, &offer_set.offers)
                .allocate(&demand)
        });

        let include_stock = self.options.include_stock.unwrap_or(world.stock.enabled);
        let stock = include_stock.then(|| StockPlanner::new(world).snapshot(&demand));
        if let Some(snapshots) = &stock {
            debug!(run_id = %run_id, snapshots = snapshots.len(), "stock snapshot taken");
        }

        report.start_date = meta.start_date;
        report.end_date = meta.end_date;
        report.calendar_days = calendar.len() as u64;
        report.products = product_ids.len() as u64;
        report.customers = world.customers.len() as u64;
        report.campaigns = campaign_set.campaigns.len() as u64;
        report.bundle_campaigns = campaign_set
            .campaigns
            .iter()
            .filter(|campaign| campaign.kind.is_bundle())
            .count() as u64;
        report.campaigns_exhausted = campaign_set.exhausted as u64;
        report.offers = offer_set.offers.len() as u64;
        report.offers_exhausted = offer_set.exhausted as u64;
        report.demand_rows = demand.row_count() as u64;
        report.demand_total = demand.total_demand();
        report.clamped_days = demand.clamped_days() as u64;
        report.degraded_years = calendar.missing_feasts().to_vec();
        report.demand_fingerprint = demand_fingerprint(&demand)?;
        if let Some(book) = &orders {
            report.orders = book.orders.len() as u64;
            report.order_lines = book.lines.len() as u64;
            report.unallocated_units = book.unallocated_units;
            if book.unallocated_units > 0.0 {
                report.record_warning(GenerationIssue::warning(
                    "demand_unallocated",
                    format!(
                        "{} demanded units had no customer to allocate to",
                        book.unallocated_units
                    ),
                ));
            }
        }

        report.stock_snapshots = stock.as_ref().map_or(0, |snapshots| snapshots.len() as u64);

        let mut output = GenerationOutput {
            calendar,
            campaigns: campaign_set.campaigns,
            assignments: campaign_set.assignments,
            offers: offer_set.offers,
            demand,
            orders,
            stock,
            report,
        };

        if self.options.audit {
            let audit = audit_run(&output, world);
            output.report.audit_violations = audit.violations.len() as u64;
            if !audit.is_clean() {
                warn!(
                    run_id = %run_id,
                    violations = audit.violations.len(),
                    "output audit found violations"
                );
                if self.options.strict {
                    return Err(GenerationError::AuditFailed(audit));
                }
                for violation in &audit.violations {
                    output.report.record_warning(GenerationIssue::warning(
                        &violation.code,
                        violation.message.clone(),
                    ));
                }
            }
        }

        output.report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            products = output.report.products,
            demand_rows = output.report.demand_rows,
            demand_total = output.report.demand_total,
            campaigns = output.report.campaigns,
            offers = output.report.offers,
            stock_snapshots = output.report.stock_snapshots,
            warnings = output.report.warnings.len(),
            duration_ms = output.report.duration_ms,
            "generation completed"
        );

        Ok(output)
    }

    /// Requested product ids in catalog order, or the whole catalog.
    fn selected_products(&self, world: &WorldConfig) -> Result<Vec<u32>, GenerationError> {
        let catalog: Vec<u32> = world.products.iter().map(|product| product.id).collect();
        let Some(requested) = &self.options.products else {
            return Ok(catalog);
        };
        let requested: BTreeSet<u32> = requested.iter().copied().collect();
        if let Some(unknown) = requested.iter().find(|id| !catalog.contains(id)) {
            return Err(GenerationError::InvalidConfig(format!(
                "product {unknown} is not in the catalog"
            )));
        }
        Ok(catalog
            .into_iter()
            .filter(|id| requested.contains(id))
            .collect())
    }
}

/// Hex SHA-256 of the combined demand table serialized as JSON.
pub fn demand_fingerprint(demand: &DemandSet) -> Result<String, GenerationError> {
    let bytes = serde_json::to_vec(&demand.combined())?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
