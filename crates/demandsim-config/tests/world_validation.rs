use std::path::Path;

use demandsim_config::{
    ConfigError, ConfigFormat, load_world, parse_world, validate_world, world_json_schema,
};
use serde_json::json;

fn reference_world_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../worlds/reference.world.toml")
}

#[test]
fn reference_world_validates() {
    let validated = load_world(&reference_world_path()).expect("reference world should load");
    assert!(validated.warnings.is_empty(), "unexpected warnings");

    let world = validated.world;
    assert_eq!(world.meta.country, "TR");
    assert_eq!(world.meta.seed, 42);
    assert_eq!(world.products.len(), 12);
    assert_eq!(world.customers.len(), 6);
    assert!(world.orders.enabled);
    assert_eq!(world.segment("retail").weekend_mult, 1.4);
}

#[test]
fn json_schema_exposes_world_sections() {
    let schema = serde_json::to_value(world_json_schema()).expect("serialize world schema");
    let properties = schema["properties"]
        .as_object()
        .expect("root schema has properties");
    for key in ["meta", "tuning", "clamp", "campaigns", "offers", "products"] {
        assert!(properties.contains_key(key), "missing property {key}");
    }
    let required = schema["required"].as_array().expect("required list");
    assert_eq!(required, &vec![json!("meta")]);
}

#[test]
fn unknown_fields_are_rejected() {
    let document = json!({
        "meta": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
        "tunning": {"smooth_alpha": 0.3}
    });
    let report = validate_world(&document).expect_err("unknown section must fail");
    assert!(report.has_error("schema_violation"));
}

#[test]
fn malformed_dates_are_rejected() {
    let document = json!({
        "meta": {"start_date": "2024-13-01", "end_date": "2024-01-31"}
    });
    let report = validate_world(&document).expect_err("invalid date must fail");
    assert!(!report.is_ok());
}

#[test]
fn minimal_json_world_applies_defaults() {
    let contents = r#"{"meta": {"start_date": "2024-01-01", "end_date": "2024-01-31"}}"#;
    let validated = parse_world(contents, ConfigFormat::Json).expect("minimal world");
    let world = validated.world;
    assert_eq!(world.meta.country, "TR");
    assert_eq!(world.meta.seed, 42);
    assert_eq!(world.tuning.smooth_alpha, 0.3);
    assert_eq!(world.campaigns.max_attempts, 500);
    assert!(world.clamp.enabled);
}

#[test]
fn reversed_range_surfaces_as_config_error() {
    let contents = r#"
        [meta]
        start_date = "2024-02-01"
        end_date = "2024-01-01"
    "#;
    let err = parse_world(contents, ConfigFormat::Toml).expect_err("reversed range");
    match err {
        ConfigError::Invalid(report) => assert!(report.has_error("invalid_date_range")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = ConfigFormat::from_path(Path::new("world.yaml")).expect_err("yaml unsupported");
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}
