// Recompute output/rates.csv from an existing canonical records file.

use anyhow::{Context, Result};
use countyflows::{pipeline::rates::run_rates, Config};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    let config = Config::resolve(env::args_os().nth(1).map(PathBuf::from))
        .context("loading configuration")?;

    let rates = run_rates(&config).with_context(|| {
        format!(
            "computing rates from {}",
            config.records_path.display()
        )
    })?;

    for rate in &rates {
        info!(
            year = %rate.year,
            in_state = rate.in_state,
            out_of_state = rate.out_of_state,
            foreign = rate.foreign,
            "rate"
        );
    }
    Ok(())
}
