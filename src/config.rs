// src/config.rs

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;

use crate::{scrape::DEFAULT_BASE_URL, store::Format};

/// Everything a run needs. Every field has a default, so an empty (or
/// missing) YAML file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub base_url: String,
    /// Season-end years, inclusive.
    pub first_season: u16,
    pub last_season: u16,
    pub pacing: Pacing,
    pub historical_target: String,
    pub lag_target: String,
    /// Statistics never ranked. The active target is always added.
    pub excluded: Vec<String>,
    pub output_dir: PathBuf,
    pub format: Format,
    pub cache_dir: Option<PathBuf>,
    pub persist: Persist,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            first_season: 2005,
            last_season: 2019,
            pacing: Pacing::default(),
            historical_target: "W/L%".to_string(),
            lag_target: "NRTG".to_string(),
            excluded: vec!["RANK".to_string()],
            output_dir: PathBuf::from("data"),
            format: Format::Csv,
            cache_dir: None,
            persist: Persist::default(),
        }
    }
}

/// Random delay between page fetches, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pacing {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_secs: 10.0,
            max_secs: 15.0,
        }
    }
}

impl Pacing {
    pub fn bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_secs_f64(self.min_secs),
            Duration::from_secs_f64(self.max_secs),
        )
    }
}

/// Which stage outputs get written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Persist {
    pub families: bool,
    pub base: bool,
    pub correlations: bool,
}

impl Default for Persist {
    fn default() -> Self {
        Self {
            families: true,
            base: true,
            correlations: true,
        }
    }
}

impl Persist {
    pub const NONE: Persist = Persist {
        families: false,
        base: false,
        correlations: false,
    };
}

impl PipelineConfig {
    /// Load from `path` if given, else defaults. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                let parsed: PipelineConfig = serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing config {}", p.display()))?;
                info!(path = %p.display(), "loaded config");
                parsed
            }
            None => PipelineConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.first_season <= self.last_season,
            "first_season {} is after last_season {}",
            self.first_season,
            self.last_season
        );
        ensure!(self.first_season >= 1, "first_season must be a season-end year");
        ensure!(
            self.pacing.min_secs.is_finite() && self.pacing.max_secs.is_finite(),
            "pacing bounds must be finite"
        );
        ensure!(
            self.pacing.min_secs >= 0.0 && self.pacing.min_secs <= self.pacing.max_secs,
            "pacing.min_secs must be in 0..=max_secs"
        );
        url::Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {}", self.base_url))?;
        Ok(())
    }

    pub fn seasons(&self) -> RangeInclusive<u16> {
        self.first_season..=self.last_season
    }

    /// `excluded` plus `target`.
    pub fn excluded_for(&self, target: &str) -> BTreeSet<String> {
        self.excluded
            .iter()
            .cloned()
            .chain(std::iter::once(target.to_string()))
            .collect()
    }
}
