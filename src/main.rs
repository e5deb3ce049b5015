use anyhow::{Context, Result};
use olist_loader::{duck::Warehouse, pipeline, LoaderConfig};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = LoaderConfig::from_env().context("loading configuration")?;
    info!(
        database = %config.database,
        schema = %config.schema,
        csv_dir = %config.csv_dir.display(),
        batch_size = config.batch_size,
        "config"
    );

    // ─── 3) open destination ─────────────────────────────────────────
    let mut warehouse = Warehouse::open(&config.database)
        .with_context(|| format!("opening {}", config.database))?
        .with_max_bind_parameters(config.max_bind_parameters);

    // ─── 4) truncate, load, validate ─────────────────────────────────
    let report = pipeline::run(&config, &mut warehouse)?;
    let rows: usize = report.loads.iter().map(|l| l.rows).sum();
    info!(rows, elapsed = ?report.elapsed, "all done");
    Ok(())
}
