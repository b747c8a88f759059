use std::fs;

use demandsim_generate::telemetry::{LogTarget, init_logging};

#[test]
fn json_logging_writes_structured_lines() {
    let path = std::env::temp_dir().join(format!(
        "demandsim_telemetry_{}.jsonl",
        std::process::id()
    ));
    let _ = fs::remove_file(&path);

    let err = init_logging(&LogTarget::JsonFile(path.clone()), "demandsim_generate=loudest")
        .expect_err("malformed filter");
    assert!(err.to_string().contains("logging"));

    init_logging(&LogTarget::JsonFile(path.clone()), "info").expect("install subscriber");
    tracing::info!(product_id = 1001_u32, "stock snapshot written");
    tracing::debug!(product_id = 1002_u32, "filtered out below info");

    let contents = fs::read_to_string(&path).expect("read log file");
    let line = contents
        .lines()
        .find(|line| line.contains("stock snapshot written"))
        .expect("info line written");
    let value: serde_json::Value = serde_json::from_str(line).expect("json line");
    assert_eq!(value["level"], "INFO");
    assert_eq!(value["fields"]["product_id"], 1001);
    assert!(value["timestamp"].is_string());
    assert!(!contents.contains("filtered out below info"));

    let err = init_logging(&LogTarget::Stderr, "info").expect_err("subscriber already set");
    assert!(err.to_string().contains("logging"));

    let _ = fs::remove_file(&path);
}
