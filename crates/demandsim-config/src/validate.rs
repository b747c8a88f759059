use std::collections::BTreeSet;

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::errors::{ConfigError, ValidationIssue, ValidationReport};
use crate::model::{OrderPolicy, PeakSeasonTable, StockPolicy, WorldConfig};
use crate::schema::world_json_schema;

/// Validated world with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedWorld {
    pub world: WorldConfig,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a world JSON document against the world JSON Schema.
pub fn validate_world_json(
    world_json: &Value,
    world_schema: &Value,
) -> Result<ValidationReport, ConfigError> {
    let compiled =
        JSONSchema::compile(world_schema).map_err(|err| ConfigError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(world_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate the world end-to-end, returning structured issues on failure.
pub fn validate_world(world_json: &Value) -> Result<ValidatedWorld, ValidationReport> {
    let structural = serde_json::to_value(world_json_schema())
        .map_err(ConfigError::from)
        .and_then(|schema| validate_world_json(world_json, &schema));
    let structural = match structural {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let world: WorldConfig = match serde_json::from_value(world_json.clone()) {
        Ok(world) => world,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "invalid_world_json",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    let semantic = validate_world_config(&world);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    Ok(ValidatedWorld {
        world,
        warnings: semantic.warnings,
    })
}

/// Semantic checks that the JSON Schema cannot express.
pub fn validate_world_config(world: &WorldConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_meta(world, &mut report);
    validate_tuning(world, &mut report);
    validate_clamp(world, &mut report);
    validate_schedules(world, &mut report);
    validate_orders(&world.orders, &mut report);
    validate_stock(&world.stock, &mut report);
    validate_peak_seasons(&world.peak_seasons, &mut report);
    validate_catalog(world, &mut report);
    validate_segments(world, &mut report);

    report
}

fn validate_meta(world: &WorldConfig, report: &mut ValidationReport) {
    let meta = &world.meta;
    if meta.end_date < meta.start_date {
        report.push(ValidationIssue::error(
            "invalid_date_range",
            "/meta/end_date",
            format!(
                "end_date {} precedes start_date {}",
                meta.end_date, meta.start_date
            ),
            Some("set end_date on or after start_date".to_string()),
        ));
    }

    let country = meta.country.trim();
    if country.len() != 2 || !country.chars().all(|ch| ch.is_ascii_alphabetic()) {
        report.push(ValidationIssue::error(
            "invalid_country",
            "/meta/country",
            format!("country '{}' is not an ISO 3166-1 alpha-2 code", meta.country),
            Some("use a two-letter code such as \"TR\"".to_string()),
        ));
    }
}

fn validate_tuning(world: &WorldConfig, report: &mut ValidationReport) {
    let tuning = &world.tuning;
    let non_negative = [
        ("demand_scale", tuning.demand_scale),
        ("latent_sigma", tuning.latent_sigma),
        ("offer_effect_alpha", tuning.offer_effect_alpha),
        ("offer_effect_cap_pct", tuning.offer_effect_cap_pct),
        ("promo_effect_alpha", tuning.promo_effect_alpha),
    ];
    for (key, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            report.push(ValidationIssue::error(
                "invalid_tuning",
                format!("/tuning/{key}"),
                format!("{key} must be a finite value >= 0"),
                None,
            ));
        }
    }

    if !(0.0..=1.0).contains(&tuning.smooth_alpha) {
        report.push(ValidationIssue::error(
            "invalid_tuning",
            "/tuning/smooth_alpha",
            "smooth_alpha must be within [0, 1]",
            Some("use 0 or 1 to disable smoothing".to_string()),
        ));
    }
    if !tuning.dispersion_scale.is_finite() || tuning.dispersion_scale <= 0.0 {
        report.push(ValidationIssue::error(
            "invalid_tuning",
            "/tuning/dispersion_scale",
            "dispersion_scale must be > 0",
            None,
        ));
    }
    if !(tuning.latent_rho.abs() < 1.0) {
        report.push(ValidationIssue::error(
            "invalid_tuning",
            "/tuning/latent_rho",
            "latent_rho must be within (-1, 1)",
            Some("values near 1 make the latent factor non-stationary".to_string()),
        ));
    }
}

fn validate_clamp(world: &WorldConfig, report: &mut ValidationReport) {
    let clamp = &world.clamp;
    if !(0.0..=1.0).contains(&clamp.soft_lambda) {
        report.push(ValidationIssue::error(
            "invalid_clamp",
            "/clamp/soft_lambda",
            "soft_lambda must be within [0, 1]",
            None,
        ));
    }
    if !clamp.band_pct.is_finite() || clamp.band_pct < 0.0 {
        report.push(ValidationIssue::error(
            "invalid_clamp",
            "/clamp/band_pct",
            "band_pct must be >= 0",
            None,
        ));
    }
    if clamp.enabled && clamp.window_days == 0 {
        report.push(ValidationIssue::warning(
            "clamp_without_reference",
            "/clamp/window_days",
            "window_days is 0; the quiet-day clamp never finds a reference",
            Some("set window_days or disable the clamp".to_string()),
        ));
    }
}

fn validate_schedules(world: &WorldConfig, report: &mut ValidationReport) {
    let windows = [
        (
            "campaigns",
            world.campaigns.per_year,
            world.campaigns.min_days,
            world.campaigns.max_days,
            world.campaigns.max_attempts,
        ),
        (
            "offers",
            world.offers.per_year,
            world.offers.min_days,
            world.offers.max_days,
            world.offers.max_attempts,
        ),
    ];
    for (section, per_year, min_days, max_days, max_attempts) in windows {
        if !per_year.is_finite() || per_year < 0.0 {
            report.push(ValidationIssue::error(
                "invalid_schedule",
                format!("/{section}/per_year"),
                "per_year must be >= 0",
                None,
            ));
        }
        if min_days == 0 || min_days > max_days {
            report.push(ValidationIssue::error(
                "invalid_schedule",
                format!("/{section}/min_days"),
                format!("window length bounds [{min_days}, {max_days}] are invalid"),
                Some("use 1 <= min_days <= max_days".to_string()),
            ));
        }
        if max_attempts == 0 {
            report.push(ValidationIssue::error(
                "invalid_schedule",
                format!("/{section}/max_attempts"),
                "max_attempts must be > 0",
                None,
            ));
        }
    }

    if !(0.0..=1.0).contains(&world.campaigns.bias_probability) {
        report.push(ValidationIssue::error(
            "invalid_schedule",
            "/campaigns/bias_probability",
            "bias_probability must be within [0, 1]",
            None,
        ));
    }
}

fn validate_orders(orders: &OrderPolicy, report: &mut ValidationReport) {
    let distributions = [
        ("basket_size_probs", &orders.basket_size_probs),
        ("countable_qty_probs", &orders.countable_qty_probs),
    ];
    for (key, probs) in distributions {
        let valid = probs.len() == 3
            && probs.iter().all(|p| p.is_finite() && *p >= 0.0)
            && probs.iter().sum::<f64>() > 0.0;
        if !valid {
            report.push(ValidationIssue::error(
                "invalid_order_policy",
                format!("/orders/{key}"),
                format!("{key} must hold three non-negative weights with a positive sum"),
                None,
            ));
        }
    }
    if !orders.noncountable_default_qty.is_finite() || orders.noncountable_default_qty <= 0.0 {
        report.push(ValidationIssue::error(
            "invalid_order_policy",
            "/orders/noncountable_default_qty",
            "noncountable_default_qty must be > 0",
            None,
        ));
    }
    if !orders.offer_uplift_alpha.is_finite() || orders.offer_uplift_alpha < 0.0 {
        report.push(ValidationIssue::error(
            "invalid_order_policy",
            "/orders/offer_uplift_alpha",
            "offer_uplift_alpha must be >= 0",
            None,
        ));
    }
}

fn validate_stock(stock: &StockPolicy, report: &mut ValidationReport) {
    if stock.recent_days == 0 {
        report.push(ValidationIssue::error(
            "invalid_stock_policy",
            "/stock/recent_days",
            "recent_days must be > 0",
            None,
        ));
    }
    if !(0.0..1.0).contains(&stock.noise_pct) {
        report.push(ValidationIssue::error(
            "invalid_stock_policy",
            "/stock/noise_pct",
            "noise_pct must be within [0, 1)",
            None,
        ));
    }
    let reserved_ok = (0.0..=1.0).contains(&stock.reserved_min_pct)
        && (0.0..=1.0).contains(&stock.reserved_max_pct)
        && stock.reserved_min_pct <= stock.reserved_max_pct;
    if !reserved_ok {
        report.push(ValidationIssue::error(
            "invalid_stock_policy",
            "/stock/reserved_min_pct",
            format!(
                "reserved share range [{}, {}] is invalid",
                stock.reserved_min_pct, stock.reserved_max_pct
            ),
            Some("use 0 <= reserved_min_pct <= reserved_max_pct <= 1".to_string()),
        ));
    }
}

fn validate_peak_seasons(table: &PeakSeasonTable, report: &mut ValidationReport) {
    let sections = [("tags", &table.tags), ("categories", &table.categories)];
    for (section, rules) in sections {
        for (idx, rule) in rules.iter().enumerate() {
            if rule.months.iter().any(|month| !(1..=12).contains(month)) {
                report.push(ValidationIssue::error(
                    "invalid_month",
                    format!("/peak_seasons/{section}/{idx}/months"),
                    format!("peak months for '{}' must be within 1..=12", rule.name),
                    None,
                ));
            }
        }
    }
}

fn validate_catalog(world: &WorldConfig, report: &mut ValidationReport) {
    if let Err(err) =
        demandsim_core::validate_catalog(&world.products, &world.customers, &world.profile_map())
    {
        report.push(ValidationIssue::error(
            "invalid_catalog",
            "/products",
            err.to_string(),
            None,
        ));
    }

    let mut unknown_segments = BTreeSet::new();
    for customer in &world.customers {
        if !world.segments.contains_key(&customer.segment) {
            unknown_segments.insert(customer.segment.clone());
        }
    }
    for segment in unknown_segments {
        report.push(ValidationIssue::warning(
            "unknown_segment",
            "/customers",
            format!("segment '{segment}' has no behavior entry; defaults apply"),
            Some("add the segment under [segments]".to_string()),
        ));
    }

    if world.products.is_empty() {
        report.push(ValidationIssue::warning(
            "products_empty",
            "/products",
            "world has no products; no demand will be generated",
            None,
        ));
    }
}

fn validate_segments(world: &WorldConfig, report: &mut ValidationReport) {
    for (name, segment) in &world.segments {
        let rates = [
            ("base_rate", segment.base_rate),
            ("weekend_mult", segment.weekend_mult),
        ];
        for (key, value) in rates {
            if !value.is_finite() || value < 0.0 {
                report.push(ValidationIssue::error(
                    "invalid_segment",
                    format!("/segments/{name}/{key}"),
                    format!("segment '{name}' {key} must be a finite value >= 0"),
                    None,
                ));
            }
        }
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
