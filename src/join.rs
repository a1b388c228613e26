// src/join.rs

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::JoinKeyError,
    table::{Cell, Table, SEASON, TEAM},
};

/// Name the base table is persisted under.
pub const BASE_TABLE: &str = "Team_Stats";

/// Left-join the six family tables on (team, season), anchored at `ratings`.
///
/// Every anchor row appears exactly once. Columns a later table shares with
/// the accumulated result are dropped, so earlier sources always win.
pub fn join(
    ratings: &Table,
    misc: &Table,
    per100: &Table,
    opp_per100: &Table,
    shooting: &Table,
    opp_shooting: &Table,
) -> Result<Table, JoinKeyError> {
    join_all(ratings, &[misc, per100, opp_per100, shooting, opp_shooting])
}

/// Left-join `others` onto `anchor` in order, applying the collision policy
/// after each step.
#[instrument(level = "info", skip_all, fields(anchor = anchor.name(), rows = anchor.len()))]
pub fn join_all(anchor: &Table, others: &[&Table]) -> Result<Table, JoinKeyError> {
    check_unique_keys(anchor)?;

    let keys: Vec<Option<(String, String)>> = (0..anchor.len())
        .map(|i| anchor.key(i).map(|(t, s)| (t.to_string(), s.to_string())))
        .collect();
    let mut columns: Vec<String> = anchor.columns().to_vec();
    let mut rows: Vec<Vec<Cell>> = anchor.rows().to_vec();

    for right in others {
        let present: HashSet<&str> = columns.iter().map(String::as_str).collect();
        let incoming: Vec<(usize, &String)> = right
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| !present.contains(c.as_str()))
            .collect();
        let dropped = right.columns().len() - incoming.len();
        debug!(
            table = right.name(),
            added = incoming.len(),
            dropped,
            "joining"
        );

        let index = key_index(right);
        let mut matched = 0usize;
        for (row, key) in rows.iter_mut().zip(&keys) {
            let hit = key
                .as_ref()
                .and_then(|(t, s)| index.get(&(t.as_str(), s.as_str())));
            match hit {
                Some(&r) => {
                    matched += 1;
                    let src = &right.rows()[r];
                    row.extend(incoming.iter().map(|(i, _)| src[*i].clone()));
                }
                None => row.extend(incoming.iter().map(|_| Cell::Absent)),
            }
        }
        if matched < rows.len() {
            debug!(
                table = right.name(),
                unmatched = rows.len() - matched,
                "anchor rows without a match"
            );
        }
        columns.extend(incoming.into_iter().map(|(_, c)| c.clone()));
    }

    info!(rows = rows.len(), columns = columns.len(), "joined base table");
    Ok(Table::new(BASE_TABLE, columns, rows))
}

fn check_unique_keys(anchor: &Table) -> Result<(), JoinKeyError> {
    let mut seen = HashSet::new();
    for i in 0..anchor.len() {
        if let Some((team, season)) = anchor.key(i) {
            if !seen.insert((team, season)) {
                return Err(JoinKeyError {
                    table: anchor.name().to_string(),
                    team: team.to_string(),
                    season: season.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// (team, season) → first row carrying it. Later duplicates are ignored so
/// they cannot multiply anchor rows.
fn key_index(table: &Table) -> HashMap<(&str, &str), usize> {
    let mut index = HashMap::with_capacity(table.len());
    for i in 0..table.len() {
        let Some(key) = table.key(i) else {
            continue;
        };
        if index.contains_key(&key) {
            warn!(
                table = table.name(),
                team = key.0,
                season = key.1,
                "duplicate key in right table; keeping first row"
            );
            continue;
        }
        index.insert(key, i);
    }
    if !table.has_column(TEAM) || !table.has_column(SEASON) {
        warn!(table = table.name(), "table has no (team, season) key columns");
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str, columns: &[&str], rows: &[(&str, &str, &[f64])]) -> Table {
        Table::new(
            name,
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|(team, season, vals)| {
                    let mut r = vec![Cell::Text(team.to_string()), Cell::Text(season.to_string())];
                    r.extend(vals.iter().map(|v| Cell::Number(*v)));
                    r
                })
                .collect(),
        )
    }

    fn empty(name: &str, columns: &[&str]) -> Table {
        t(name, columns, &[])
    }

    #[test]
    fn every_anchor_row_appears_exactly_once() {
        let ratings = t(
            "ratings",
            &["TEAM", "SEASON", "NRTG"],
            &[
                ("Chicago Bulls", "2010-2011", &[7.0]),
                ("Chicago Bulls", "2011-2012", &[9.0]),
                ("Miami Heat", "2010-2011", &[8.0]),
            ],
        );
        let misc = t(
            "misc",
            &["TEAM", "SEASON", "PACE"],
            &[
                ("Miami Heat", "2010-2011", &[91.2]),
                ("Chicago Bulls", "2010-2011", &[89.1]),
                ("Orlando Magic", "2010-2011", &[90.0]),
            ],
        );
        let per100 = empty("per100", &["TEAM", "SEASON", "PER100_PTS"]);
        let base = join(&ratings, &misc, &per100, &per100, &per100, &per100).unwrap();

        assert_eq!(base.len(), 3);
        assert_eq!(base.columns(), &["TEAM", "SEASON", "NRTG", "PACE", "PER100_PTS"]);
        assert_eq!(base.cell(0, "PACE"), Some(&Cell::Number(89.1)));
        assert_eq!(base.cell(1, "PACE"), Some(&Cell::Absent));
        assert_eq!(base.cell(2, "PACE"), Some(&Cell::Number(91.2)));
        assert_eq!(base.cell(2, "PER100_PTS"), Some(&Cell::Absent));
    }

    #[test]
    fn earlier_table_wins_column_collisions() {
        let ratings = t("ratings", &["TEAM", "SEASON", "W"], &[("Utah Jazz", "2016-2017", &[51.0])]);
        let misc = t(
            "misc",
            &["TEAM", "SEASON", "G", "W"],
            &[("Utah Jazz", "2016-2017", &[82.0, 99.0])],
        );
        let per100 = t("per100", &["TEAM", "SEASON", "G"], &[("Utah Jazz", "2016-2017", &[81.0])]);
        let e = empty("e", &["TEAM", "SEASON"]);

        let base = join(&ratings, &misc, &per100, &e, &e, &e).unwrap();
        assert_eq!(base.columns(), &["TEAM", "SEASON", "W", "G"]);
        assert_eq!(base.cell(0, "W"), Some(&Cell::Number(51.0)));
        assert_eq!(base.cell(0, "G"), Some(&Cell::Number(82.0)));
    }

    #[test]
    fn duplicate_anchor_key_is_fatal() {
        let ratings = t(
            "Team_Ratings",
            &["TEAM", "SEASON"],
            &[("Utah Jazz", "2016-2017", &[]), ("Utah Jazz", "2016-2017", &[])],
        );
        let e = empty("e", &["TEAM", "SEASON"]);
        let err = join(&ratings, &e, &e, &e, &e, &e).unwrap_err();
        assert_eq!(err.team, "Utah Jazz");
        assert_eq!(err.table, "Team_Ratings");
    }

    #[test]
    fn duplicate_right_key_does_not_multiply_rows() {
        let ratings = t("ratings", &["TEAM", "SEASON"], &[("Utah Jazz", "2016-2017", &[])]);
        let misc = t(
            "misc",
            &["TEAM", "SEASON", "PACE"],
            &[("Utah Jazz", "2016-2017", &[93.0]), ("Utah Jazz", "2016-2017", &[94.0])],
        );
        let e = empty("e", &["TEAM", "SEASON"]);
        let base = join(&ratings, &misc, &e, &e, &e, &e).unwrap();
        assert_eq!(base.len(), 1);
        assert_eq!(base.cell(0, "PACE"), Some(&Cell::Number(93.0)));
    }
}
