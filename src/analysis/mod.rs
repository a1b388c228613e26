// src/analysis/mod.rs

pub mod correlation;
pub mod lags;
pub mod matrix;
pub mod ranking;

use std::collections::BTreeSet;
use tracing::{info, instrument};

pub use correlation::Method;
pub use lags::{lagged, season_lags, LAG_SUFFIX};
pub use matrix::{correlation_matrix, matrix_artifact};
pub use ranking::{rank_correlations, CorrelationRecord, Ranking, Scope};

use crate::{config::PipelineConfig, error::PipelineError, table::Table};

pub const TOTAL_CORRELATIONS: &str = "Basketball_Reference_Total_Correlations";
pub const SEASON_CORRELATIONS: &str = "Basketball_Reference_Season_Correlations";
pub const SEASON_NET_RATING_CORRELATIONS: &str =
    "Basketball_Reference_Season_Net_Rating_Correlations";
pub const LAG_CORRELATIONS: &str = "Basketball_Reference_Lag_Correlations";

/// Every analysis output derived from one base table.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// All seasons pooled, against the historical target.
    pub total: Ranking,
    /// Each season on its own, against the historical target.
    pub by_season: Ranking,
    /// Each season on its own, against the lag target.
    pub lag_target_by_season: Ranking,
    pub lags: Table,
    /// This season's statistics against next season's lag target.
    pub lag: Ranking,
    pub pearson: Table,
    pub spearman: Table,
}

impl Analysis {
    /// (artifact name, table) for everything worth persisting.
    pub fn tables(&self) -> Vec<(String, Table)> {
        vec![
            (TOTAL_CORRELATIONS.into(), self.total.to_table(TOTAL_CORRELATIONS)),
            (SEASON_CORRELATIONS.into(), self.by_season.to_table(SEASON_CORRELATIONS)),
            (
                SEASON_NET_RATING_CORRELATIONS.into(),
                self.lag_target_by_season.to_table(SEASON_NET_RATING_CORRELATIONS),
            ),
            (self.lags.name().to_string(), self.lags.clone()),
            (LAG_CORRELATIONS.into(), self.lag.to_table(LAG_CORRELATIONS)),
            (self.pearson.name().to_string(), self.pearson.clone()),
            (self.spearman.name().to_string(), self.spearman.clone()),
        ]
    }

    pub fn rankings(&self) -> [&Ranking; 4] {
        [&self.total, &self.by_season, &self.lag_target_by_season, &self.lag]
    }
}

/// Run every ranking, the season lags and both matrices over `base`.
#[instrument(level = "info", skip_all, fields(rows = base.len()))]
pub fn analyse(base: &Table, config: &PipelineConfig) -> Result<Analysis, PipelineError> {
    let rank = |table: &Table, target: &str, scope: Scope, excluded: &BTreeSet<String>| {
        rank_correlations(table, target, scope, excluded).map_err(|source| PipelineError::Rank {
            target: target.to_string(),
            source,
        })
    };

    let historical = config.historical_target.as_str();
    let historical_excluded = config.excluded_for(historical);
    let total = rank(base, historical, Scope::AllTime, &historical_excluded)?;
    let by_season = rank(base, historical, Scope::PerSeason, &historical_excluded)?;

    let lag_target_by_season = rank(
        base,
        config.lag_target.as_str(),
        Scope::PerSeason,
        &config.excluded_for(&config.lag_target),
    )?;

    let lags = season_lags(base);
    let lag_target = lagged(&config.lag_target);
    let mut lag_excluded = config.excluded_for(&lag_target);
    lag_excluded.extend(
        lags.columns()
            .iter()
            .filter(|c| c.ends_with(LAG_SUFFIX))
            .cloned(),
    );
    let lag = rank(&lags, lag_target.as_str(), Scope::AllTime, &lag_excluded)?;

    let pearson = correlation_matrix(base, Method::Pearson);
    let spearman = correlation_matrix(base, Method::Spearman);

    let analysis = Analysis {
        total,
        by_season,
        lag_target_by_season,
        lags,
        lag,
        pearson,
        spearman,
    };
    info!(
        degenerate = analysis
            .rankings()
            .iter()
            .map(|r| r.degenerate.len())
            .sum::<usize>(),
        "analysis complete"
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn base() -> Table {
        let columns = ["TEAM", "SEASON", "RANK", "W/L%", "NRTG", "PACE"]
            .map(String::from)
            .to_vec();
        let mut rows = Vec::new();
        for (s, season) in ["2016-2017", "2017-2018", "2018-2019"].iter().enumerate() {
            for t in 0..4 {
                let wl = 0.2 + 0.2 * t as f64 + 0.01 * s as f64;
                rows.push(vec![
                    Cell::Text(format!("Team {t}")),
                    Cell::Text(season.to_string()),
                    Cell::Number(t as f64 + 1.0),
                    Cell::Number(wl),
                    Cell::Number(wl * 20.0 - 10.0 + s as f64),
                    Cell::Number([98.0, 101.5, 96.0, 100.0][t] + s as f64),
                ]);
            }
        }
        Table::new("Team_Stats", columns, rows)
    }

    #[test]
    fn lag_ranking_ignores_other_lagged_columns() -> anyhow::Result<()> {
        let a = analyse(&base(), &PipelineConfig::default())?;
        assert_eq!(a.lags.len(), 8);
        assert_eq!(a.lag.target, "NRTG_lag");
        assert!(a.lag.records.iter().all(|r| !r.statistic.ends_with("_lag")));
        assert!(a.lag.records.iter().all(|r| r.statistic != "RANK"));
        Ok(())
    }

    #[test]
    fn every_artifact_is_produced() -> anyhow::Result<()> {
        let a = analyse(&base(), &PipelineConfig::default())?;
        let names: Vec<String> = a.tables().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "Basketball_Reference_Total_Correlations",
                "Basketball_Reference_Season_Correlations",
                "Basketball_Reference_Season_Net_Rating_Correlations",
                "Basketball_Reference_Season_Lags",
                "Basketball_Reference_Lag_Correlations",
                "pearson_correlation",
                "spearman_correlation",
            ]
        );
        assert_eq!(a.total.records[0].statistic, "NRTG");
        assert!(a.lag_target_by_season.records.iter().all(|r| r.statistic != "NRTG"));
        Ok(())
    }

    #[test]
    fn missing_target_surfaces_as_pipeline_error() {
        let config = PipelineConfig {
            historical_target: "WINS".into(),
            ..PipelineConfig::default()
        };
        let err = analyse(&base(), &config).unwrap_err();
        assert!(matches!(err, PipelineError::Rank { ref target, .. } if target == "WINS"));
    }
}
