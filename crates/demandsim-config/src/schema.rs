use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::WorldConfig;

/// Emit the JSON Schema for world configuration documents.
pub fn world_json_schema() -> RootSchema {
    schema_for!(WorldConfig)
}
