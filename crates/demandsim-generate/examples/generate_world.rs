use std::env;
use std::path::PathBuf;

use demandsim_config::load_world;
use demandsim_generate::telemetry::{LogTarget, init_logging};
use demandsim_generate::{GenerateOptions, GenerationEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut world_path: Option<PathBuf> = None;
    let mut options = GenerateOptions::default();
    let mut log_target = LogTarget::Stderr;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--strict" => options.strict = true,
            "--no-audit" => options.audit = false,
            "--orders" => options.include_orders = Some(true),
            "--no-orders" => options.include_orders = Some(false),
            "--no-stock" => options.include_stock = Some(false),
            "--log-json" => {
                let path = args.next().ok_or("missing --log-json path")?;
                log_target = LogTarget::JsonFile(PathBuf::from(path));
            }
            "--products" => {
                let list = args.next().ok_or("missing --products list")?;
                let ids = list
                    .split(',')
                    .map(|id| id.trim().parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()?;
                options.products = Some(ids);
            }
            _ => {
                if world_path.is_none() {
                    world_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    init_logging(&log_target, &filter)?;

    let world_path = world_path.unwrap_or_else(|| PathBuf::from("worlds/reference.world.toml"));
    let validated = load_world(&world_path)?;

    let engine = GenerationEngine::new(options);
    let output = engine.run(&validated.world)?;

    println!("{}", serde_json::to_string_pretty(&output.report)?);
    Ok(())
}
