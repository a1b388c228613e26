// src/aggregate.rs

use serde::Serialize;
use std::{collections::HashSet, ops::RangeInclusive};
use tracing::{info, instrument, warn};

use crate::{
    error::AggregateError,
    schema::{normalize, season_label, Family},
    scrape::{extract, season_page_url, PageSource},
    table::Table,
};

/// Why a season slice was left out of a family table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    Fetch,
    Extraction,
    Normalization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonSkip {
    pub family: Family,
    pub season: String,
    pub kind: SkipKind,
    pub reason: String,
}

/// A family table plus the record of which seasons made it in.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub family: Family,
    pub table: Table,
    pub seasons: Vec<String>,
    pub skipped: Vec<SeasonSkip>,
}

impl Aggregation {
    /// (team, season) pairs that occur more than once. Never merged here;
    /// callers decide what a duplicate means.
    pub fn duplicate_keys(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for i in 0..self.table.len() {
            if let Some((team, season)) = self.table.key(i) {
                if !seen.insert((team, season)) {
                    dups.push((team.to_string(), season.to_string()));
                }
            }
        }
        dups
    }
}

/// Fetch, extract and normalize `family` for every season in `seasons`,
/// oldest first, and stack the surviving slices.
///
/// A season whose page cannot be fetched, lacks the table, or fails
/// normalization is skipped and recorded. Only zero surviving seasons is an
/// error. The result always has the family's canonical column shape.
#[instrument(level = "info", skip(source, base_url, family, seasons), fields(family = %family))]
pub fn aggregate<S: PageSource + ?Sized>(
    source: &S,
    base_url: &str,
    family: Family,
    seasons: RangeInclusive<u16>,
) -> Result<Aggregation, AggregateError> {
    let schema = family.schema();
    let mut slices = Vec::new();
    let mut covered = Vec::new();
    let mut skipped = Vec::new();
    let mut attempted = 0usize;

    for year in seasons {
        attempted += 1;
        let season = season_label(year);
        let skip = |kind: SkipKind, reason: String| {
            warn!(family = %family, season = %season, ?kind, %reason, "skipping season");
            SeasonSkip {
                family,
                season: season.clone(),
                kind,
                reason,
            }
        };

        let body = match season_page_url(base_url, schema.page, year).and_then(|u| source.fetch(&u)) {
            Ok(b) => b,
            Err(e) => {
                skipped.push(skip(SkipKind::Fetch, format!("{e:#}")));
                continue;
            }
        };
        let grid = match extract(&body, schema.table_id) {
            Ok(g) => g,
            Err(e) => {
                skipped.push(skip(SkipKind::Extraction, e.to_string()));
                continue;
            }
        };
        match normalize(&grid, schema, year) {
            Ok(slice) => {
                covered.push(season.clone());
                slices.push(slice);
            }
            Err(e) => skipped.push(skip(SkipKind::Normalization, e.to_string())),
        }
    }

    if slices.is_empty() {
        return Err(AggregateError { family, attempted });
    }

    let table = Table::concat(schema.artifact, schema.column_order(), &slices);
    let aggregation = Aggregation {
        family,
        table,
        seasons: covered,
        skipped,
    };
    for (team, season) in aggregation.duplicate_keys() {
        warn!(family = %family, %team, %season, "duplicate (team, season) in family table");
    }
    info!(
        rows = aggregation.table.len(),
        seasons = aggregation.seasons.len(),
        skipped = aggregation.skipped.len(),
        "aggregated family"
    );
    Ok(aggregation)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal season pages for the summary and ratings layouts.

    /// Summary page with a live per-100 table and a commented-out misc table.
    pub fn summary_page(teams: &[(&str, u32, u32)]) -> String {
        let mut per100 = String::new();
        let mut misc = String::new();
        for (i, (team, w, l)) in teams.iter().enumerate() {
            let rk = i + 1;
            per100.push_str(&format!(
                "<tr><th>{rk}</th><td>{team}</td><td>82</td><td>19780</td>{}</tr>\n",
                (0..21)
                    .map(|k| format!("<td>{}</td>", 30 + (rk * 7 + k * 3) % 11))
                    .collect::<String>()
            ));
            misc.push_str(&format!(
                "<tr><th>{rk}</th><td>{team}</td><td>27.{rk}</td><td>{w}</td><td>{l}</td>{}<td>Arena {rk}</td><td>700,000</td><td>17,000</td></tr>\n",
                (0..20)
                    .map(|k| format!("<td>{}</td>", (rk * (k + 2)) % 13))
                    .collect::<String>()
            ));
        }
        let per100_head: String = std::iter::once("<th>Rk</th><th>Team</th><th>G</th><th>MP</th>".to_string())
            .chain((0..21).map(|k| format!("<th>S{k}</th>")))
            .collect();
        let misc_head: String = std::iter::once("<th>Rk</th><th>Team</th><th>Age</th><th>W</th><th>L</th>".to_string())
            .chain((0..20).map(|k| format!("<th>M{k}</th>")))
            .chain(std::iter::once("<th>Arena</th><th>Attend.</th><th>Attend./G</th>".to_string()))
            .collect();
        format!(
            r#"<html><body>
<table id="team-stats-per_poss"><thead><tr>{per100_head}</tr></thead><tbody>
{per100}</tbody><tfoot><tr><th></th><td>League Average</td><td>82</td></tr></tfoot></table>
<div class="placeholder"></div>
<!--
<table id="misc_stats"><thead>
<tr class="over_header"><th colspan="5"></th><th colspan="23">Misc</th></tr>
<tr>{misc_head}</tr></thead><tbody>
{misc}</tbody></table>
-->
</body></html>"#
        )
    }

    /// Ratings page; `nrtg` doubles as every other numeric column.
    pub fn ratings_page(teams: &[(&str, u32, u32, f64)]) -> String {
        let mut body = String::new();
        for (i, (team, w, l, nrtg)) in teams.iter().enumerate() {
            let pct = *w as f64 / (*w + *l) as f64;
            body.push_str(&format!(
                "<tr><th>{}</th><td>{team}</td><td>E</td><td>A</td><td>{w}</td><td>{l}</td><td>{pct:.3}</td><td>{nrtg}</td><td>110.0</td><td>{}</td><td>{nrtg}</td><td>{nrtg}</td><td>{}</td><td>{}</td><td>{nrtg}</td></tr>\n",
                i + 1,
                110.0 - nrtg,
                110.0 + (i as f64),
                110.0 - nrtg * 0.5,
            ));
        }
        format!(
            r#"<html><body><table id="ratings"><thead>
<tr class="over_header"><th colspan="13"></th><th colspan="2">Adjusted</th></tr>
<tr><th>Rk</th><th>Team</th><th>Conf</th><th>Div</th><th>W</th><th>L</th><th>W/L%</th><th>MOV</th><th>ORtg</th><th>DRtg</th><th>NRtg</th><th>MOV/A</th><th>ORtg/A</th><th>DRtg/A</th><th>NRtg/A</th></tr>
</thead><tbody>
{body}</tbody></table></body></html>"#
        )
    }
}
