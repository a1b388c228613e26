// src/analysis/ranking.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

use super::correlation::Method;
use crate::{
    error::{RankError, RankingDegenerateError},
    table::{Cell, Table, SEASON},
};

/// Decimal places kept on `average_rank`.
pub const AVERAGE_RANK_DECIMALS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    AllTime,
    PerSeason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRecord {
    pub season: Option<String>,
    pub statistic: String,
    pub pearson: f64,
    pub pearson_abs: f64,
    pub spearman: f64,
    pub spearman_abs: f64,
    pub pearson_rank: usize,
    pub spearman_rank: usize,
    pub average_rank: f64,
}

/// Ordered ranking plus the statistics that could not be ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub target: String,
    pub scope: Scope,
    pub records: Vec<CorrelationRecord>,
    pub degenerate: Vec<RankingDegenerateError>,
}

impl Ranking {
    /// Flatten into a table with the published column layout.
    pub fn to_table(&self, name: &str) -> Table {
        let per_season = self.scope == Scope::PerSeason;
        let mut columns: Vec<String> = Vec::new();
        if per_season {
            columns.push(SEASON.to_string());
        }
        columns.extend(
            [
                "STATISTIC",
                "PEARSON_CORRELATION",
                "PEARSON_CORRELATION_ABS",
                "SPEARMAN_CORRELATION",
                "SPEARMAN_CORRELATION_ABS",
                "PEARSON_CORRELATION_RANK",
                "SPEARMAN_CORRELATION_RANK",
                "AVERAGE_RANK",
            ]
            .map(String::from),
        );

        let rows = self
            .records
            .iter()
            .map(|r| {
                let mut row = Vec::with_capacity(columns.len());
                if per_season {
                    row.push(r.season.clone().map(Cell::Text).unwrap_or(Cell::Absent));
                }
                row.extend([
                    Cell::Text(r.statistic.clone()),
                    Cell::Number(r.pearson),
                    Cell::Number(r.pearson_abs),
                    Cell::Number(r.spearman),
                    Cell::Number(r.spearman_abs),
                    Cell::Number(r.pearson_rank as f64),
                    Cell::Number(r.spearman_rank as f64),
                    Cell::Number(r.average_rank),
                ]);
                row
            })
            .collect();
        Table::new(name, columns, rows)
    }

    /// The strongest `n` statistics (per season when scoped so).
    pub fn top(&self, n: usize) -> impl Iterator<Item = &CorrelationRecord> {
        let mut per_group = 0usize;
        let mut current: Option<Option<String>> = None;
        self.records.iter().filter(move |r| {
            if current.as_ref() != Some(&r.season) {
                current = Some(r.season.clone());
                per_group = 0;
            }
            per_group += 1;
            per_group <= n
        })
    }
}

/// Rank every numeric statistic of `base` by the strength of its association
/// with `target`.
///
/// `target` and every name in `excluded` are left out. Statistics whose
/// Pearson or Spearman coefficient is undefined are dropped before ranks are
/// handed out and reported in [`Ranking::degenerate`].
#[instrument(level = "info", skip(base, excluded), fields(rows = base.len()))]
pub fn rank_correlations(
    base: &Table,
    target: &str,
    scope: Scope,
    excluded: &BTreeSet<String>,
) -> Result<Ranking, RankError> {
    if !base.has_column(target) {
        return Err(RankError::MissingTarget(target.to_string()));
    }
    if !base.is_empty() && !base.is_numeric_column(target) {
        return Err(RankError::NonNumericTarget(target.to_string()));
    }

    let statistics: Vec<&str> = base
        .numeric_columns()
        .into_iter()
        .filter(|c| *c != target && !excluded.contains(*c))
        .collect();
    debug!(candidates = statistics.len(), "statistics to rank");

    let mut ranking = Ranking {
        target: target.to_string(),
        scope,
        records: Vec::new(),
        degenerate: Vec::new(),
    };

    match scope {
        Scope::AllTime => {
            rank_group(base, target, &statistics, None, &mut ranking);
        }
        Scope::PerSeason => {
            if !base.has_column(SEASON) {
                return Err(RankError::MissingSeasonColumn(SEASON.to_string()));
            }
            let mut seasons = base.distinct_text(SEASON);
            // "YYYY-YYYY" labels sort chronologically as text
            seasons.sort_by(|a, b| b.cmp(a));
            for season in seasons {
                let subset = base.filter_text(SEASON, &season);
                rank_group(&subset, target, &statistics, Some(season), &mut ranking);
            }
        }
    }

    info!(
        ranked = ranking.records.len(),
        degenerate = ranking.degenerate.len(),
        "ranked correlations"
    );
    Ok(ranking)
}

/// Rank one group (the whole table, or one season) and append its records.
fn rank_group(
    rows: &Table,
    target: &str,
    statistics: &[&str],
    season: Option<String>,
    out: &mut Ranking,
) {
    let Some(y) = rows.numeric_column(target) else {
        return;
    };

    let mut scored: Vec<(String, f64, f64)> = Vec::with_capacity(statistics.len());
    for statistic in statistics {
        let Some(x) = rows.numeric_column(statistic) else {
            continue;
        };
        let p = Method::Pearson.correlate_pairwise(&x, &y);
        let s = Method::Spearman.correlate_pairwise(&x, &y);
        match (p, s) {
            (Some(p), Some(s)) => scored.push((statistic.to_string(), p, s)),
            _ => {
                warn!(
                    statistic,
                    target,
                    season = season.as_deref().unwrap_or("all"),
                    "correlation undefined; dropping statistic"
                );
                out.degenerate.push(RankingDegenerateError {
                    statistic: statistic.to_string(),
                    target: target.to_string(),
                    season: season.clone(),
                });
            }
        }
    }

    let pearson_ranks = strength_ranks(scored.iter().map(|(_, p, _)| *p));
    let spearman_ranks = strength_ranks(scored.iter().map(|(_, _, s)| *s));

    let mut records: Vec<CorrelationRecord> = scored
        .into_iter()
        .zip(pearson_ranks.into_iter().zip(spearman_ranks))
        .map(|((statistic, pearson, spearman), (pr, sr))| CorrelationRecord {
            season: season.clone(),
            statistic,
            pearson,
            pearson_abs: pearson.abs(),
            spearman,
            spearman_abs: spearman.abs(),
            pearson_rank: pr,
            spearman_rank: sr,
            average_rank: round_to((pr + sr) as f64 / 2.0, AVERAGE_RANK_DECIMALS),
        })
        .collect();
    // stable: equal average ranks keep statistic order
    records.sort_by(|a, b| a.average_rank.total_cmp(&b.average_rank));
    out.records.extend(records);
}

/// 1-based rank of each value by absolute magnitude, strongest first. Equal
/// magnitudes keep input order.
fn strength_ranks(values: impl Iterator<Item = f64>) -> Vec<usize> {
    let values: Vec<f64> = values.collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].abs().total_cmp(&values[a].abs()));
    let mut ranks = vec![0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = rank + 1;
    }
    ranks
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}
