//! Core contracts for demandsim.
//!
//! This crate defines the record shapes shared by the configuration loader
//! and the generation engine: catalog inputs, calendar days, promotion
//! windows, demand profiles and demand observations.

pub mod calendar;
pub mod catalog;
pub mod demand;
pub mod error;
pub mod promo;
pub mod validation;

pub use calendar::{CalendarDay, CalendarEvent, Season};
pub use catalog::{COUNTABLE_UOMS, Customer, Product, SegmentBehavior, is_countable_uom};
pub use demand::{DailyDemandObservation, EventMultipliers, ProductDemandProfile, SeasonMultipliers};
pub use error::{Error, Result};
pub use promo::{
    Campaign, CampaignAssignment, CampaignKind, CustomerOffer, DateWindow,
    bundle_equivalent_percent, round2, round3, stack_discounts,
};
pub use validation::validate_catalog;

/// Current record contract version for generated datasets.
pub const DATASET_VERSION: &str = "0.1";
