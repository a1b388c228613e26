// src/store/csv.rs

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

use super::{artifact_paths, Format, TableStore};
use crate::table::{Cell, Table};

/// One `<name>.csv` per table. Absent cells are empty fields, flags `1`/`0`.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Empty → absent, parseable → number, anything else → text.
fn infer_cell(field: &str) -> Cell {
    if field.is_empty() {
        return Cell::Absent;
    }
    match field.parse::<f64>() {
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Text(field.to_string()),
    }
}

impl TableStore for CsvStore {
    #[instrument(level = "debug", skip(self, table), fields(rows = table.len()))]
    fn write(&self, name: &str, table: &Table) -> Result<PathBuf> {
        let (final_path, tmp_path) = artifact_paths(&self.dir, name, Format::Csv);
        {
            let mut wtr = csv::Writer::from_path(&tmp_path)
                .with_context(|| format!("creating `{}`", tmp_path.display()))?;
            wtr.write_record(table.columns())
                .context("writing CSV header")?;
            for row in table.rows() {
                wtr.write_record(row.iter().map(|c| c.to_string()))
                    .context("writing CSV row")?;
            }
            wtr.flush().context("flushing CSV writer")?;
        }
        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("renaming into `{}`", final_path.display()))?;
        debug!(path = %final_path.display(), "wrote table");
        Ok(final_path)
    }

    #[instrument(level = "debug", skip(self))]
    fn read(&self, name: &str) -> Result<Table> {
        let (path, _) = artifact_paths(&self.dir, name, Format::Csv);
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .with_context(|| format!("opening `{}`", path.display()))?;
        let columns: Vec<String> = rdr
            .headers()
            .context("reading CSV header")?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("reading row {} of `{}`", i + 1, path.display()))?;
            rows.push(record.iter().map(infer_cell).collect());
        }
        debug!(rows = rows.len(), "read table");
        Ok(Table::new(name, columns, rows))
    }

    fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{assert_round_trip, sample};

    #[test]
    fn table_survives_a_csv_round_trip() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let store = CsvStore::new(tmp.path());
        let path = store.write("Team_Stats", &sample())?;
        assert_eq!(path, tmp.path().join("Team_Stats.csv"));
        assert!(!tmp.path().join("Team_Stats.csv.tmp").exists());

        let text = fs::read_to_string(&path)?;
        assert!(text.starts_with("RANK,SEASON,TEAM,PLAYOFF_TEAM,W/L%,ARENA\n"));
        assert!(text.contains("2,2018-2019,Cleveland Cavaliers,0,,\n"));

        assert_round_trip(&store.read("Team_Stats")?);
        Ok(())
    }

    #[test]
    fn reading_a_missing_table_fails_with_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = CsvStore::new(tmp.path()).read("Nope").unwrap_err();
        assert!(format!("{err:#}").contains("Nope.csv"));
    }
}
