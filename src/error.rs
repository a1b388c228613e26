// src/error.rs

use thiserror::Error;

use crate::schema::Family;

/// The requested table id is not on the page, neither in the live DOM nor in
/// any commented-out block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("table `{table_id}` not found on page")]
    TableNotFound { table_id: String },

    #[error("table `{table_id}` has no header row")]
    MissingHeader { table_id: String },
}

/// A derived field could not be computed for a row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("{field} undefined for {team} in {season}: {reason}")]
    UndefinedDerivation {
        field: String,
        team: String,
        season: String,
        reason: String,
    },
}

/// The anchor table of a join carries the same (team, season) more than once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("duplicate join key ({team}, {season}) in anchor table `{table}`")]
pub struct JoinKeyError {
    pub table: String,
    pub team: String,
    pub season: String,
}

/// A statistic whose correlation with the target is undefined. Never fatal:
/// the statistic is dropped from the ranking and this value is reported
/// alongside the result.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("correlation of `{statistic}` with `{target}` undefined{}", in_season(.season))]
pub struct RankingDegenerateError {
    pub statistic: String,
    pub target: String,
    pub season: Option<String>,
}

fn in_season(season: &Option<String>) -> String {
    season
        .as_deref()
        .map(|s| format!(" in {s}"))
        .unwrap_or_default()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error("target statistic `{0}` not present in table")]
    MissingTarget(String),

    #[error("target statistic `{0}` is not numeric")]
    NonNumericTarget(String),

    #[error("per-season ranking needs a `{0}` column")]
    MissingSeasonColumn(String),
}

/// Every season of a family was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no season of family `{family}` could be aggregated ({attempted} attempted)")]
pub struct AggregateError {
    pub family: Family,
    pub attempted: usize,
}

/// Fatal pipeline failures, carrying enough context to locate the defect.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("anchor family failed: {0}")]
    Anchor(#[from] AggregateError),

    #[error(transparent)]
    Join(#[from] JoinKeyError),

    #[error("ranking against `{target}` failed: {source}")]
    Rank {
        target: String,
        #[source]
        source: RankError,
    },

    #[error("persisting `{name}`: {source}")]
    Store {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
