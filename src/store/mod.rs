// src/store/mod.rs

pub mod csv;
pub mod manifest;
pub mod parquet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::table::Table;

pub use self::csv::CsvStore;
pub use self::manifest::{FamilyCoverage, RunManifest};
pub use self::parquet::ParquetStore;

/// Write/read a table by artifact name. One file per table.
pub trait TableStore {
    fn write(&self, name: &str, table: &Table) -> Result<PathBuf>;
    fn read(&self, name: &str) -> Result<Table>;
    fn dir(&self) -> &Path;
}

impl<T: TableStore + ?Sized> TableStore for Box<T> {
    fn write(&self, name: &str, table: &Table) -> Result<PathBuf> {
        (**self).write(name, table)
    }
    fn read(&self, name: &str) -> Result<Table> {
        (**self).read(name)
    }
    fn dir(&self) -> &Path {
        (**self).dir()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Csv,
    Parquet,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Parquet => "parquet",
        }
    }
}

/// Open a store of `format` rooted at `dir`, creating the directory.
pub fn open_store(format: Format, dir: impl Into<PathBuf>) -> Result<Box<dyn TableStore>> {
    let dir = dir.into();
    fs::create_dir_all(&dir).with_context(|| format!("could not create `{}`", dir.display()))?;
    Ok(match format {
        Format::Csv => Box::new(CsvStore::new(dir)),
        Format::Parquet => Box::new(ParquetStore::new(dir)),
    })
}

/// `dir/name.ext` plus the temp path written first and renamed over it.
pub(crate) fn artifact_paths(dir: &Path, name: &str, format: Format) -> (PathBuf, PathBuf) {
    let final_path = dir.join(format!("{name}.{}", format.extension()));
    let tmp_path = dir.join(format!("{name}.{}.tmp", format.extension()));
    (final_path, tmp_path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::table::Cell;

    pub fn sample() -> Table {
        Table::new(
            "Team_Stats",
            ["RANK", "SEASON", "TEAM", "PLAYOFF_TEAM", "W/L%", "ARENA"]
                .map(String::from)
                .to_vec(),
            vec![
                vec![
                    Cell::Number(1.0),
                    Cell::Text("2018-2019".into()),
                    Cell::Text("Milwaukee Bucks".into()),
                    Cell::Flag(true),
                    Cell::Number(0.7317073170731707),
                    Cell::Text("Fiserv Forum".into()),
                ],
                vec![
                    Cell::Number(2.0),
                    Cell::Text("2018-2019".into()),
                    Cell::Text("Cleveland Cavaliers".into()),
                    Cell::Flag(false),
                    Cell::Absent,
                    Cell::Absent,
                ],
            ],
        )
    }

    /// What a store hands back for `sample()`: flags come back as 0/1 numbers.
    pub fn assert_round_trip(back: &Table) {
        assert_eq!(back.name(), "Team_Stats");
        assert_eq!(back.columns(), sample().columns());
        assert_eq!(back.len(), 2);
        assert_eq!(back.key(0), Some(("Milwaukee Bucks", "2018-2019")));
        assert_eq!(back.cell(0, "PLAYOFF_TEAM"), Some(&Cell::Number(1.0)));
        assert_eq!(back.cell(1, "PLAYOFF_TEAM"), Some(&Cell::Number(0.0)));
        assert_eq!(back.cell(0, "W/L%"), Some(&Cell::Number(0.7317073170731707)));
        assert_eq!(back.cell(1, "W/L%"), Some(&Cell::Absent));
        assert_eq!(back.cell(1, "ARENA"), Some(&Cell::Absent));
    }

    #[test]
    fn open_store_creates_directory() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("nested").join("data");
        let store = open_store(Format::Csv, &dir)?;
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
        Ok(())
    }
}
