// src/store/manifest.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::aggregate::{Aggregation, SeasonSkip};
use crate::schema::Family;

pub const MANIFEST_FILE: &str = "run_manifest.json";

/// Which seasons each family covered, and why the others were skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub first_season: u16,
    pub last_season: u16,
    pub families: Vec<FamilyCoverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyCoverage {
    pub family: Family,
    pub artifact: String,
    pub rows: usize,
    pub seasons: Vec<String>,
    pub skipped: Vec<SkippedSeason>,
    /// Set when the family produced nothing and an empty table stood in.
    pub failed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSeason {
    pub season: String,
    pub kind: String,
    pub reason: String,
}

impl From<&SeasonSkip> for SkippedSeason {
    fn from(s: &SeasonSkip) -> Self {
        Self {
            season: s.season.clone(),
            kind: serde_json::to_value(s.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            reason: s.reason.clone(),
        }
    }
}

impl FamilyCoverage {
    pub fn covered(agg: &Aggregation) -> Self {
        Self {
            family: agg.family,
            artifact: agg.table.name().to_string(),
            rows: agg.table.len(),
            seasons: agg.seasons.clone(),
            skipped: agg.skipped.iter().map(SkippedSeason::from).collect(),
            failed: None,
        }
    }

    pub fn failed(family: Family, reason: String) -> Self {
        Self {
            family,
            artifact: family.schema().artifact.to_string(),
            rows: 0,
            seasons: Vec::new(),
            skipped: Vec::new(),
            failed: Some(reason),
        }
    }
}

impl RunManifest {
    pub fn start(first_season: u16, last_season: u16) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            first_season,
            last_season,
            families: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).context("serializing run manifest")?;
        fs::write(&path, json).with_context(|| format!("writing `{}`", path.display()))?;
        Ok(path)
    }

    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading `{}`", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing `{}`", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SkipKind;
    use crate::table::Table;

    #[test]
    fn manifest_records_coverage_and_skips() -> Result<()> {
        let agg = Aggregation {
            family: Family::Misc,
            table: Table::empty("Miscellaneous_Stats", vec!["TEAM".into()]),
            seasons: vec!["2017-2018".into()],
            skipped: vec![SeasonSkip {
                family: Family::Misc,
                season: "2018-2019".into(),
                kind: SkipKind::Extraction,
                reason: "table `misc_stats` not found on page".into(),
            }],
        };
        let mut m = RunManifest::start(2018, 2019);
        m.families.push(FamilyCoverage::covered(&agg));
        m.families
            .push(FamilyCoverage::failed(Family::OppShooting, "no season".into()));
        m.finish();

        let tmp = tempfile::tempdir()?;
        m.write(tmp.path())?;
        let back = RunManifest::read(tmp.path())?;
        assert_eq!(back, m);
        assert_eq!(back.families[0].skipped[0].kind, "extraction");
        assert_eq!(back.families[1].artifact, "Opponent_Shooting");

        let raw = fs::read_to_string(tmp.path().join(MANIFEST_FILE))?;
        assert!(raw.contains("\"family\": \"misc\""));
        Ok(())
    }
}
