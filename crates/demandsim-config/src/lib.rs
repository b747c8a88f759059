//! World configuration contracts and validation for demandsim.

pub mod errors;
pub mod load;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{ConfigError, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use load::{ConfigFormat, load_world, parse_world};
pub use model::{
    CampaignPolicy, ClampConfig, MetaConfig, OfferPolicy, OrderPolicy, PeakSeasonRule,
    PeakSeasonTable, ProductProfileEntry, StockPolicy, TuningConfig, WorldConfig,
};
pub use schema::world_json_schema;
pub use validate::{ValidatedWorld, validate_world, validate_world_config, validate_world_json};

/// Current contract version for world configuration documents.
pub const WORLD_VERSION: &str = "0.1";
