mod renderer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use emberview_core::model::{FlamegraphData, ValueMode};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: emberview <flamegraph.json> [--weight]");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let use_weight = args.iter().skip(2).any(|a| a == "--weight");
    let mode = if use_weight {
        ValueMode::Weight
    } else {
        ValueMode::Samples
    };

    let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let graph: FlamegraphData =
        serde_json::from_slice(&data).context("decoding flame-graph JSON")?;

    log::info!(
        "loaded {} levels, {} titles",
        graph.levels.len(),
        graph.title_pool.len()
    );

    renderer::run(graph, mode)
}
