// src/table.rs

use std::{collections::HashSet, fmt};

pub const TEAM: &str = "TEAM";
pub const SEASON: &str = "SEASON";
pub const PLAYOFF_TEAM: &str = "PLAYOFF_TEAM";

/// One value of a table. `Absent` stands in for a field a source did not
/// publish (older seasons, unmatched join rows, unparseable cells).
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Flag(bool),
    Absent,
}

impl Cell {
    /// Numeric view used by the correlation engine; flags count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(_) | Cell::Absent => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number(_) | Cell::Flag(_))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Flag(b) => f.write_str(if *b { "1" } else { "0" }),
            Cell::Absent => Ok(()),
        }
    }
}

/// An immutable, named, column-ordered table. Every stage produces a fresh
/// `Table`; nothing mutates one after it has been handed on.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, padding short rows with `Absent` and truncating long
    /// ones so every row matches the column count.
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Absent);
                r
            })
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn empty(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self::new(name, columns, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Values of a column as `f64`, `None` where absent or textual.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_f64()).collect())
    }

    /// A column is numeric when it has at least one present value and every
    /// present value is a number or flag.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        let mut seen = false;
        for row in &self.rows {
            match &row[idx] {
                Cell::Absent => {}
                c if c.is_numeric() => seen = true,
                _ => return false,
            }
        }
        seen
    }

    /// Names of every numeric column, in column order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| self.is_numeric_column(c))
            .map(String::as_str)
            .collect()
    }

    /// The (team, season) key of a row, if both cells are text.
    pub fn key(&self, row: usize) -> Option<(&str, &str)> {
        let team = self.cell(row, TEAM)?.as_str()?;
        let season = self.cell(row, SEASON)?.as_str()?;
        Some((team, season))
    }

    /// Rows whose `column` equals the text `value`, as a new table.
    pub fn filter_text(&self, column: &str, value: &str) -> Table {
        let rows = match self.column_index(column) {
            Some(idx) => self
                .rows
                .iter()
                .filter(|r| r[idx].as_str() == Some(value))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Table::new(self.name.clone(), self.columns.clone(), rows)
    }

    /// Distinct text values of `column`, in first-appearance order.
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.column_index(column) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            if let Some(v) = row[idx].as_str() {
                if seen.insert(v) {
                    out.push(v.to_string());
                }
            }
        }
        out
    }

    /// Project onto `columns`; names this table lacks become `Absent` columns.
    pub fn reindex<S: AsRef<str>>(&self, columns: &[S]) -> Table {
        let lookup: Vec<Option<usize>> = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|r| {
                lookup
                    .iter()
                    .map(|i| i.map(|i| r[i].clone()).unwrap_or(Cell::Absent))
                    .collect()
            })
            .collect();
        Table::new(
            self.name.clone(),
            columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        )
    }

    /// Stack `parts` under `columns`, reindexing each part first.
    pub fn concat<'a>(
        name: impl Into<String>,
        columns: Vec<String>,
        parts: impl IntoIterator<Item = &'a Table>,
    ) -> Table {
        let mut rows = Vec::new();
        for part in parts {
            rows.extend(part.reindex(&columns).rows);
        }
        Table::new(name, columns, rows)
    }

    pub fn renamed(self, name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            "sample",
            vec!["TEAM".into(), "SEASON".into(), "W".into(), "ARENA".into()],
            vec![
                vec![
                    Cell::Text("Boston Celtics".into()),
                    Cell::Text("2007-2008".into()),
                    Cell::Number(66.0),
                    Cell::Text("TD Banknorth Garden".into()),
                ],
                vec![
                    Cell::Text("Miami Heat".into()),
                    Cell::Text("2007-2008".into()),
                    Cell::Absent,
                ],
            ],
        )
    }

    #[test]
    fn short_rows_are_padded() {
        let t = sample();
        assert_eq!(t.rows()[1].len(), 4);
        assert_eq!(t.cell(1, "ARENA"), Some(&Cell::Absent));
    }

    #[test]
    fn numeric_detection_ignores_absent_cells() {
        let t = sample();
        assert!(t.is_numeric_column("W"));
        assert!(!t.is_numeric_column("ARENA"));
        assert_eq!(t.numeric_columns(), vec!["W"]);
    }

    #[test]
    fn reindex_fills_unknown_columns() {
        let t = sample().reindex(&["SEASON", "TEAM", "PACE"]);
        assert_eq!(t.columns(), &["SEASON", "TEAM", "PACE"]);
        assert_eq!(t.key(0), Some(("Boston Celtics", "2007-2008")));
        assert!(t.rows().iter().all(|r| r[2].is_absent()));
    }
}
