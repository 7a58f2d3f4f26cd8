use std::path::PathBuf;

use anyhow::Context;
use candle_core::Device;
use tracing_subscriber::EnvFilter;

use mag_longitudinal::datasets::{Dataset, OgbMag};
use mag_longitudinal::pipeline;
use mag_longitudinal::settings::ExtractConfig;

// cargo run --release -- [config.toml]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ExtractConfig::load(config_path.as_deref()).map_err(|e| {
        tracing::error!(error = %e, "failed to load configuration");
        e
    })?;
    tracing::info!(?config, "starting extraction");

    let device = Device::Cpu;
    let dataset = OgbMag::new(&config.dataset, &device);
    let (graph, labels) = dataset.load().context("failed to load the dataset")?;
    tracing::info!("loaded {}\n{graph}", config.dataset.name);

    let output = pipeline::run(&config, &graph, &labels)?;
    tracing::info!(
        papers = output.labels.dims()[0],
        years = output.yearly.len(),
        "done"
    );
    Ok(())
}
