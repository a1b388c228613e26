// src/pipeline.rs

use tracing::{error, info, instrument, warn};

use crate::{
    aggregate::aggregate,
    analysis::{self, Analysis},
    config::PipelineConfig,
    error::PipelineError,
    join::{join, BASE_TABLE},
    schema::Family,
    scrape::PageSource,
    store::{FamilyCoverage, RunManifest, TableStore},
    table::Table,
};

/// The six family tables, one slot per family.
#[derive(Debug, Clone)]
pub struct FamilyTables {
    pub ratings: Table,
    pub misc: Table,
    pub per100: Table,
    pub opp_per100: Table,
    pub shooting: Table,
    pub opp_shooting: Table,
}

impl FamilyTables {
    /// Every slot holds its family's empty canonical table.
    pub fn empty() -> Self {
        let e = |f: Family| Table::empty(f.schema().artifact, f.schema().column_order());
        Self {
            ratings: e(Family::Ratings),
            misc: e(Family::Misc),
            per100: e(Family::Per100),
            opp_per100: e(Family::OppPer100),
            shooting: e(Family::Shooting),
            opp_shooting: e(Family::OppShooting),
        }
    }

    pub fn get(&self, family: Family) -> &Table {
        match family {
            Family::Ratings => &self.ratings,
            Family::Misc => &self.misc,
            Family::Per100 => &self.per100,
            Family::OppPer100 => &self.opp_per100,
            Family::Shooting => &self.shooting,
            Family::OppShooting => &self.opp_shooting,
        }
    }

    fn slot(&mut self, family: Family) -> &mut Table {
        match family {
            Family::Ratings => &mut self.ratings,
            Family::Misc => &mut self.misc,
            Family::Per100 => &mut self.per100,
            Family::OppPer100 => &mut self.opp_per100,
            Family::Shooting => &mut self.shooting,
            Family::OppShooting => &mut self.opp_shooting,
        }
    }

    /// Left-join all six on (team, season), anchored at ratings.
    pub fn join(&self) -> Result<Table, PipelineError> {
        Ok(join(
            &self.ratings,
            &self.misc,
            &self.per100,
            &self.opp_per100,
            &self.shooting,
            &self.opp_shooting,
        )?)
    }
}

/// What a full run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub families: FamilyTables,
    pub base: Table,
    pub analysis: Analysis,
    pub manifest: RunManifest,
}

/// Drives scrape → normalize → join → analyse, persisting each stage when
/// configured to and a store is attached.
pub struct Pipeline<S> {
    source: S,
    store: Option<Box<dyn TableStore>>,
    config: PipelineConfig,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            store: None,
            config,
        }
    }

    pub fn with_store(mut self, store: Box<dyn TableStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[instrument(level = "info", skip(self), fields(first = self.config.first_season, last = self.config.last_season))]
    pub fn run(&self) -> Result<RunOutput, PipelineError> {
        let mut manifest = RunManifest::start(self.config.first_season, self.config.last_season);

        let families = self.scrape_families(&mut manifest)?;
        let base = self.build_base(&families)?;
        let analysis = self.analyse(&base)?;

        manifest.finish();
        if let Some(store) = &self.store {
            match manifest.write(store.dir()) {
                Ok(path) => info!(path = %path.display(), "wrote run manifest"),
                Err(e) => {
                    return Err(PipelineError::Store {
                        name: "run_manifest".to_string(),
                        source: e,
                    })
                }
            }
        }

        Ok(RunOutput {
            families,
            base,
            analysis,
            manifest,
        })
    }

    /// Aggregate every family over the configured seasons.
    ///
    /// The ratings family anchors the join, so its failure is fatal. Any
    /// other family that yields no season is replaced by its empty canonical
    /// table and the run carries on.
    pub fn scrape_families(&self, manifest: &mut RunManifest) -> Result<FamilyTables, PipelineError> {
        let mut tables = FamilyTables::empty();
        for family in Family::ALL {
            match aggregate(&self.source, &self.config.base_url, family, self.config.seasons()) {
                Ok(agg) => {
                    manifest.families.push(FamilyCoverage::covered(&agg));
                    *tables.slot(family) = agg.table;
                }
                Err(e) if family == Family::Ratings => return Err(e.into()),
                Err(e) => {
                    error!(%family, error = %e, "family failed; continuing with an empty table");
                    manifest
                        .families
                        .push(FamilyCoverage::failed(family, e.to_string()));
                }
            }
            if self.config.persist.families {
                self.persist(family.schema().artifact, tables.get(family))?;
            }
        }
        Ok(tables)
    }

    /// Join the family tables into the base table.
    pub fn build_base(&self, families: &FamilyTables) -> Result<Table, PipelineError> {
        let base = families.join()?;
        if base.is_empty() {
            warn!("base table has no rows");
        }
        if self.config.persist.base {
            self.persist(BASE_TABLE, &base)?;
        }
        Ok(base)
    }

    /// Rankings, lags and matrices over `base`.
    pub fn analyse(&self, base: &Table) -> Result<Analysis, PipelineError> {
        let analysis = analysis::analyse(base, &self.config)?;
        if self.config.persist.correlations {
            for (name, table) in analysis.tables() {
                self.persist(&name, &table)?;
            }
        }
        Ok(analysis)
    }

    fn persist(&self, name: &str, table: &Table) -> Result<(), PipelineError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let path = store
            .write(name, table)
            .map_err(|source| PipelineError::Store {
                name: name.to_string(),
                source,
            })?;
        info!(name, rows = table.len(), path = %path.display(), "persisted table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::{ratings_page, summary_page};
    use crate::config::Persist;
    use crate::schema::Page;
    use crate::scrape::{season_page_url, source::mock::MemorySource};
    use crate::store::{manifest::MANIFEST_FILE, CsvStore};
    use crate::table::Cell;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    const BASE: &str = "https://bbref.test";

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,nbacorr=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn source() -> MemorySource {
        let ratings = [
            ("Milwaukee Bucks", 60, 22, 8.9),
            ("Toronto Raptors", 58, 24, 6.0),
            ("Detroit Pistons", 41, 41, -0.2),
            ("New York Knicks", 17, 65, -9.3),
        ];
        let summary = [
            ("Milwaukee Bucks*", 60, 22),
            ("Toronto Raptors*", 58, 24),
            ("Detroit Pistons*", 41, 41),
            ("New York Knicks", 17, 65),
        ];
        let mut source = MemorySource::default();
        for year in [2018, 2019] {
            source = source
                .with_page(
                    &season_page_url(BASE, Page::Ratings, year).unwrap(),
                    ratings_page(&ratings),
                )
                .with_page(
                    &season_page_url(BASE, Page::Summary, year).unwrap(),
                    summary_page(&summary),
                );
        }
        source
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            base_url: BASE.to_string(),
            first_season: 2018,
            last_season: 2019,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn full_run_joins_and_persists_every_stage() -> anyhow::Result<()> {
        init_test_logging();
        let tmp = tempfile::tempdir()?;
        let pipeline =
            Pipeline::new(source(), config()).with_store(Box::new(CsvStore::new(tmp.path())));
        let out = pipeline.run()?;

        // one row per ratings (team, season)
        assert_eq!(out.base.len(), 8);
        assert_eq!(out.base.name(), "Team_Stats");
        assert_eq!(&out.base.columns()[..3], &["RANK", "TEAM", "SEASON"]);
        assert_eq!(out.base.cell(0, "PLAYOFF_TEAM"), Some(&Cell::Flag(true)));
        assert_eq!(out.base.cell(3, "PLAYOFF_TEAM"), Some(&Cell::Flag(false)));
        // ratings W/L% is the one that survives the join
        assert_eq!(out.base.cell(0, "W/L%"), Some(&Cell::Number(0.732)));
        assert!(out.base.has_column("PER100_PTS"));
        // shooting pages are absent: empty family, columns still joined
        assert!(out.base.has_column("HEAVE_MAKES"));
        assert_eq!(out.base.cell(0, "HEAVE_MAKES"), Some(&Cell::Absent));

        assert!(out.manifest.families.iter().any(|f| f.family == Family::Shooting && f.failed.is_some()));
        assert_eq!(out.manifest.families[0].seasons, vec!["2017-2018", "2018-2019"]);

        for name in [
            "Team_Ratings",
            "Miscellaneous_Stats",
            "Team_Shooting",
            "Team_Stats",
            "Basketball_Reference_Total_Correlations",
            "Basketball_Reference_Season_Lags",
            "spearman_correlation",
        ] {
            assert!(tmp.path().join(format!("{name}.csv")).is_file(), "{name} not written");
        }
        assert!(tmp.path().join(MANIFEST_FILE).is_file());

        let total = &out.analysis.total;
        assert_eq!(total.target, "W/L%");
        assert!(!total.records.is_empty());
        assert!(total.records.iter().all(|r| r.statistic != "RANK"));
        Ok(())
    }

    #[test]
    fn missing_ratings_is_fatal() {
        let pipeline = Pipeline::new(MemorySource::default(), config());
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, PipelineError::Anchor(ref e) if e.family == Family::Ratings));
    }

    #[test]
    fn nothing_is_written_when_persistence_is_off() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let config = PipelineConfig {
            persist: Persist::NONE,
            ..config()
        };
        let out = Pipeline::new(source(), config)
            .with_store(Box::new(CsvStore::new(tmp.path())))
            .run()?;
        assert_eq!(out.base.len(), 8);
        let written: Vec<_> = std::fs::read_dir(tmp.path())?
            .filter_map(Result::ok)
            .map(|e| e.file_name())
            .collect();
        assert_eq!(written, vec![std::ffi::OsString::from(MANIFEST_FILE)]);
        Ok(())
    }
}
