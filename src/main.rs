use anyhow::{Context, Result};
use countyflows::{
    extract::CalamineDecoder,
    pipeline::{rates::run_rates, run_extract},
    Config,
};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::resolve(env::args_os().nth(1).map(PathBuf::from))
        .context("loading configuration")?;

    // ─── 3) every release → canonical records ────────────────────────
    let records = run_extract(&config, &CalamineDecoder).context("extracting records")?;
    info!(
        records = records.len(),
        path = %config.records_path.display(),
        "canonical records written"
    );

    // ─── 4) yearly rates ─────────────────────────────────────────────
    let rates = run_rates(&config).context("computing rates")?;
    info!(
        years = rates.len(),
        path = %config.rates_path.display(),
        "rates written"
    );

    info!("all done");
    Ok(())
}
