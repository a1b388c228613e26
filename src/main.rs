use anyhow::{Context, Result};
use nbacorr::{
    analysis::Ranking,
    scrape::{CachedSource, HttpSource, PacedSource, PageSource, RandomPacer},
    store::open_store,
    Pipeline, PipelineConfig,
};
use std::{env, path::PathBuf, time::Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nbacorr=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    // usage: nbacorr [CONFIG_YAML]
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref())?;
    info!(
        seasons = ?config.seasons(),
        out = %config.output_dir.display(),
        format = ?config.format,
        "configured"
    );

    // ─── 3) build the fetch stack ────────────────────────────────────
    let (min, max) = config.pacing.bounds();
    let paced = PacedSource::new(HttpSource::new()?, RandomPacer::new(min, max));
    let source: Box<dyn PageSource> = match &config.cache_dir {
        // pacing sits under the cache so cache hits skip the delay
        Some(dir) => Box::new(CachedSource::new(paced, dir)?),
        None => Box::new(paced),
    };
    let store = open_store(config.format, &config.output_dir)?;

    // ─── 4) run ──────────────────────────────────────────────────────
    let start = Instant::now();
    let out = Pipeline::new(source, config)
        .with_store(store)
        .run()
        .context("pipeline run failed")?;
    info!(
        rows = out.base.len(),
        columns = out.base.columns().len(),
        elapsed = ?start.elapsed(),
        "done"
    );

    log_top(&out.analysis.total, 10);
    log_top(&out.analysis.lag, 10);
    Ok(())
}

fn log_top(ranking: &Ranking, n: usize) {
    for r in ranking.top(n) {
        info!(
            target_stat = %ranking.target,
            statistic = %r.statistic,
            pearson = r.pearson,
            spearman = r.spearman,
            average_rank = r.average_rank,
            "top correlation"
        );
    }
}
