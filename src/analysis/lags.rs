// src/analysis/lags.rs

use std::collections::HashMap;
use tracing::{info, instrument};

use crate::table::{Cell, Table, TEAM};

pub const LAG_SUFFIX: &str = "_lag";

/// Name of the lagged copy of `column`.
pub fn lagged(column: &str) -> String {
    format!("{column}{LAG_SUFFIX}")
}

/// Pair every row with the same team's next row in table order.
///
/// The next row's non-TEAM columns are appended with a `_lag` suffix. Rows
/// with no following row for their team are dropped, so the result answers
/// "how does this season relate to the team's next one".
#[instrument(level = "info", skip(base), fields(rows = base.len()))]
pub fn season_lags(base: &Table) -> Table {
    let name = "Basketball_Reference_Season_Lags";
    let Some(team_idx) = base.column_index(TEAM) else {
        return Table::empty(name, base.columns().to_vec());
    };

    let lag_idx: Vec<usize> = (0..base.columns().len()).filter(|i| *i != team_idx).collect();
    let mut columns = base.columns().to_vec();
    columns.extend(lag_idx.iter().map(|&i| lagged(&base.columns()[i])));

    // row index of each team's following row
    let mut next: Vec<Option<usize>> = vec![None; base.len()];
    let mut last_seen: HashMap<&str, usize> = HashMap::new();
    for (i, row) in base.rows().iter().enumerate() {
        if let Some(team) = row[team_idx].as_str() {
            if let Some(prev) = last_seen.insert(team, i) {
                next[prev] = Some(i);
            }
        }
    }

    let rows: Vec<Vec<Cell>> = base
        .rows()
        .iter()
        .zip(&next)
        .filter_map(|(row, n)| {
            let following = &base.rows()[(*n)?];
            let mut out = row.clone();
            out.extend(lag_idx.iter().map(|&i| following[i].clone()));
            Some(out)
        })
        .collect();

    info!(rows = rows.len(), "built season lags");
    Table::new(name, columns, rows)
}
