// src/schema/normalize.rs

use tracing::{debug, instrument, trace};

use super::family::{Derivation, FamilySchema};
use crate::{
    error::NormalizationError,
    scrape::RawGrid,
    table::{Cell, Table, PLAYOFF_TEAM, SEASON, TEAM},
};

/// Glyph the site appends to playoff teams' names.
pub const PLAYOFF_MARKER: char = '*';

/// Team label of the summary row that is not a real team.
pub const LEAGUE_AVERAGE: &str = "League Average";

/// `2019` → `"2018-2019"`. Year 0 has no predecessor and labels as `"0-0"`.
pub fn season_label(season_end_year: u16) -> String {
    format!("{}-{}", season_end_year.saturating_sub(1), season_end_year)
}

/// Strip the playoff marker and padding; returns the clean name and whether
/// the marker was present.
pub fn split_playoff_marker(raw: &str) -> (String, bool) {
    let playoff = raw.contains(PLAYOFF_MARKER);
    let team = raw.trim_matches(|c: char| c == PLAYOFF_MARKER || c.is_whitespace());
    (team.to_string(), playoff)
}

/// Parse a numeric cell. Thousands separators are dropped; blanks and
/// anything unparseable become `Absent`.
pub fn parse_number(raw: &str) -> Cell {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Cell::Absent;
    }
    match cleaned.parse::<f64>() {
        Ok(v) => Cell::Number(v),
        Err(_) => {
            trace!(raw, "unparseable numeric cell");
            Cell::Absent
        }
    }
}

/// Map one season's grid onto the family schema.
///
/// Spacer columns (blank last-row label) are removed, then `schema.fields` is
/// laid over the remaining columns by position. Extra raw columns are
/// dropped and missing ones become `Absent`. The result is reindexed to the
/// schema's canonical column order.
#[instrument(level = "debug", skip(grid, schema), fields(family = %schema.family))]
pub fn normalize(
    grid: &RawGrid,
    schema: &FamilySchema,
    season_end_year: u16,
) -> Result<Table, NormalizationError> {
    let season = season_label(season_end_year);
    let keep: Vec<usize> = grid
        .labels()
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, _)| i)
        .collect();
    if keep.len() != schema.fields.len() {
        debug!(
            raw = keep.len(),
            expected = schema.fields.len(),
            %season,
            "column count differs from schema"
        );
    }

    let mut columns: Vec<String> = schema.fields.iter().map(|f| f.to_string()).collect();
    columns.extend(schema.derived.iter().map(|d| d.field().to_string()));
    columns.push(SEASON.to_string());
    if schema.playoff_marker {
        columns.push(PLAYOFF_TEAM.to_string());
    }
    let team_idx = schema.fields.iter().position(|f| *f == TEAM);

    let mut rows = Vec::with_capacity(grid.rows.len());
    for raw in &grid.rows {
        let mut row: Vec<Cell> = schema
            .fields
            .iter()
            .enumerate()
            .map(|(pos, field)| {
                let value = keep.get(pos).and_then(|&i| raw.get(i));
                match value {
                    None => Cell::Absent,
                    Some(v) if schema.is_text(field) => {
                        if v.trim().is_empty() {
                            Cell::Absent
                        } else {
                            Cell::Text(v.trim().to_string())
                        }
                    }
                    Some(v) => parse_number(v),
                }
            })
            .collect();

        let mut playoff = false;
        if let Some(idx) = team_idx {
            if let Cell::Text(name) = &row[idx] {
                let (team, marked) = split_playoff_marker(name);
                playoff = marked;
                row[idx] = Cell::Text(team);
            }
            if row[idx].as_str() == Some(LEAGUE_AVERAGE) {
                trace!(%season, "dropping league average row");
                continue;
            }
        }

        for derivation in schema.derived {
            let value = derive(derivation, schema, &row, &season)?;
            row.push(value);
        }
        row.push(Cell::Text(season.clone()));
        if schema.playoff_marker {
            row.push(Cell::Flag(playoff));
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), %season, "normalized season slice");
    Ok(Table::new(schema.artifact, columns, rows).reindex(schema.column_order))
}

fn derive(
    derivation: &Derivation,
    schema: &FamilySchema,
    row: &[Cell],
    season: &str,
) -> Result<Cell, NormalizationError> {
    let value_of = |name: &str| {
        schema
            .fields
            .iter()
            .position(|f| *f == name)
            .and_then(|i| row[i].as_f64())
    };
    match *derivation {
        Derivation::Share { field, part, other } => {
            let (Some(p), Some(o)) = (value_of(part), value_of(other)) else {
                return Ok(Cell::Absent);
            };
            if p == 0.0 && o == 0.0 {
                let team = schema
                    .fields
                    .iter()
                    .position(|f| *f == TEAM)
                    .and_then(|i| row[i].as_str())
                    .unwrap_or("?")
                    .to_string();
                return Err(NormalizationError::UndefinedDerivation {
                    field: field.to_string(),
                    team,
                    season: season.to_string(),
                    reason: format!("{part} and {other} are both zero"),
                });
            }
            Ok(Cell::Number(p / (p + o)))
        }
    }
}
