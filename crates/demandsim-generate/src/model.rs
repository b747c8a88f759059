use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use demandsim_config::ValidationIssue;

use crate::calendar::MissingFeast;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Fail the run when the output audit finds violations.
    pub strict: bool,
    /// Run the output audit after generation.
    pub audit: bool,
    /// Restrict demand simulation to these product ids; all products otherwise.
    pub products: Option<Vec<u32>>,
    /// Override `orders.enabled` from the world.
    pub include_orders: Option<bool>,
    /// Override `stock.enabled` from the world.
    pub include_stock: Option<bool>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            audit: true,
            products: None,
            include_orders: None,
            include_stock: None,
        }
    }
}

/// Structured generation issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u32>,
}

impl GenerationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.to_string(),
            message: message.into(),
            path: None,
            year: None,
            product_id: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<&ValidationIssue> for GenerationIssue {
    fn from(issue: &ValidationIssue) -> Self {
        GenerationIssue::warning(&issue.code, issue.message.clone()).with_path(issue.path.clone())
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub dataset_version: String,
    pub world_name: String,
    pub country: String,
    pub seed: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub calendar_days: u64,
    pub products: u64,
    pub customers: u64,
    pub campaigns: u64,
    pub bundle_campaigns: u64,
    pub campaigns_exhausted: u64,
    pub offers: u64,
    pub offers_exhausted: u64,
    pub demand_rows: u64,
    pub demand_total: u64,
    pub clamped_days: u64,
    pub orders: u64,
    pub order_lines: u64,
    pub unallocated_units: f64,
    pub stock_snapshots: u64,
    pub degraded_years: Vec<MissingFeast>,
    pub audit_violations: u64,
    /// SHA-256 of the combined demand table serialized as JSON.
    pub demand_fingerprint: String,
    pub duration_ms: u64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
}

impl GenerationReport {
    pub fn new(run_id: String, world_name: &str, country: &str, seed: u64) -> Self {
        Self {
            run_id,
            dataset_version: demandsim_core::DATASET_VERSION.to_string(),
            world_name: world_name.to_string(),
            country: country.to_string(),
            seed,
            start_date: NaiveDate::default(),
            end_date: NaiveDate::default(),
            calendar_days: 0,
            products: 0,
            customers: 0,
            campaigns: 0,
            bundle_campaigns: 0,
            campaigns_exhausted: 0,
            offers: 0,
            offers_exhausted: 0,
            demand_rows: 0,
            demand_total: 0,
            clamped_days: 0,
            orders: 0,
            order_lines: 0,
            unallocated_units: 0.0,
            stock_snapshots: 0,
            degraded_years: Vec::new(),
            audit_violations: 0,
            demand_fingerprint: String::new(),
            duration_ms: 0,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }
}
