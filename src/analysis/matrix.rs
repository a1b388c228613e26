// src/analysis/matrix.rs

use tracing::{debug, instrument};

use super::correlation::Method;
use crate::table::{Cell, Table};

/// Leading label column of a correlation matrix.
pub const STATISTIC: &str = "STATISTIC";

/// Artifact name of the full matrix for `method`.
pub fn matrix_artifact(method: Method) -> String {
    format!("{}_correlation", method.as_str())
}

/// Full pairwise correlation matrix across every numeric column of `table`.
///
/// Each cell uses the pairwise-complete observations of its two columns.
/// Undefined coefficients are `Absent`; the diagonal is 1 wherever the
/// column has variance.
#[instrument(level = "info", skip(table), fields(rows = table.len()))]
pub fn correlation_matrix(table: &Table, method: Method) -> Table {
    let names: Vec<&str> = table.numeric_columns();
    let values: Vec<Vec<Option<f64>>> = names
        .iter()
        .map(|n| table.numeric_column(n).unwrap_or_default())
        .collect();
    let k = names.len();

    let mut grid = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = method.correlate_pairwise(&values[i], &values[j]);
            grid[i][j] = r;
            grid[j][i] = r;
        }
    }

    let mut columns = vec![STATISTIC.to_string()];
    columns.extend(names.iter().map(|n| n.to_string()));
    let rows = names
        .iter()
        .zip(grid)
        .map(|(name, line)| {
            std::iter::once(Cell::Text(name.to_string()))
                .chain(line.into_iter().map(|r| r.map(Cell::Number).unwrap_or(Cell::Absent)))
                .collect()
        })
        .collect();

    debug!(statistics = k, %method, "built correlation matrix");
    Table::new(matrix_artifact(method), columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_symmetric_and_skips_text() {
        let t = Table::new(
            "Team_Stats",
            ["TEAM", "X", "Y", "K"].map(String::from).to_vec(),
            vec![
                vec![Cell::Text("a".into()), Cell::Number(1.0), Cell::Number(3.0), Cell::Number(1.0)],
                vec![Cell::Text("b".into()), Cell::Number(2.0), Cell::Number(2.0), Cell::Number(1.0)],
                vec![Cell::Text("c".into()), Cell::Number(3.0), Cell::Number(1.0), Cell::Number(1.0)],
            ],
        );
        let m = correlation_matrix(&t, Method::Spearman);
        assert_eq!(m.name(), "spearman_correlation");
        assert_eq!(m.columns(), &["STATISTIC", "X", "Y", "K"]);
        assert_eq!(m.cell(0, "X"), Some(&Cell::Number(1.0)));
        assert_eq!(m.cell(0, "Y"), Some(&Cell::Number(-1.0)));
        assert_eq!(m.cell(1, "X"), Some(&Cell::Number(-1.0)));
        assert_eq!(m.cell(2, "K"), Some(&Cell::Absent));
    }
}
