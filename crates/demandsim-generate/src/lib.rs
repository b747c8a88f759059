//! Deterministic synthetic demand generation for demandsim.
//!
//! This crate turns a validated world definition into a daily calendar,
//! non-overlapping campaigns and customer offers, per-product daily demand,
//! optional sales orders and a closing stock snapshot. Every stream is seeded from the world seed, so
//! a run is reproducible down to the demand fingerprint in its report.

pub mod calendar;
pub mod campaigns;
pub mod checks;
pub mod demand;
pub mod engine;
pub mod errors;
pub mod holidays;
pub mod model;
pub mod orders;
pub mod scheduler;
pub mod seed;
pub mod stock;
pub mod telemetry;

pub use calendar::{Calendar, CalendarBuilder, Feast, MissingFeast};
pub use campaigns::{CampaignGenerator, CampaignSet, OfferSet};
pub use checks::{AuditReport, AuditViolation, audit_run};
pub use demand::{DemandSet, DemandSimulator, ProductSeries};
pub use engine::{GenerationEngine, GenerationOutput, demand_fingerprint};
pub use errors::GenerationError;
pub use holidays::{HolidayProvider, provider_for_country};
pub use model::{GenerateOptions, GenerationIssue, GenerationReport};
pub use orders::{OrderAllocator, OrderBook};
pub use scheduler::{IntervalScheduler, Placement};
pub use stock::{StockPlanner, StockSnapshot};
