// src/bin/correlations.rs
//
// Recompute every analysis output from a previously stored base table.
// No network access.

use anyhow::{Context, Result};
use nbacorr::{analysis, join::BASE_TABLE, store::open_store, PipelineConfig};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nbacorr=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // usage: correlations [CONFIG_YAML]
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref())?;

    let store = open_store(config.format, &config.output_dir)?;
    let base = store
        .read(BASE_TABLE)
        .with_context(|| format!("loading {BASE_TABLE}; run `nbacorr` first"))?;
    info!(rows = base.len(), columns = base.columns().len(), "loaded base table");

    let out = analysis::analyse(&base, &config)?;
    for (name, table) in out.tables() {
        let path = store.write(&name, &table)?;
        info!(%name, rows = table.len(), path = %path.display(), "wrote");
    }

    for r in out.total.top(10) {
        info!(
            statistic = %r.statistic,
            pearson = r.pearson,
            spearman = r.spearman,
            average_rank = r.average_rank,
            "top correlation with {}",
            out.total.target
        );
    }
    Ok(())
}
