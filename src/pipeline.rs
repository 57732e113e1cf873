use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{OrganismPrefix, default_biotypes, default_reference_biotypes};
use crate::error::IdMergeError;
use crate::export;
use crate::loader::{self, LoadStats};
use crate::report::ReportSink;
use crate::stages::{
    self, BiotypeOutcome, CleanOptions, CleanOutcome, DedupOutcome, DelinkOutcome, MergeOutcome,
};
use crate::store::IdentifierStore;
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Wide export plus optional reverse mappings to a processed triplet file.
    Process,
    /// Triplet files to a processed triplet file.
    Scrub,
    /// Wide export to triplets and descriptions, cleaning only.
    Melt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Clean,
    BiotypeFilter,
    Delink,
    Merge,
    Dedup,
    CleanEmpties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub symbols: usize,
    pub entities: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// `None` skips the entity part of the biotype filter.
    pub biotypes: Option<Vec<String>>,
    pub reference_biotypes: Vec<String>,
    pub clean: CleanOptions,
    pub merge_names: bool,
    pub organism_prefix: Option<OrganismPrefix>,
}

impl PipelineOptions {
    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Process => Self {
                biotypes: Some(default_biotypes()),
                reference_biotypes: default_reference_biotypes(),
                clean: CleanOptions::default(),
                merge_names: true,
                organism_prefix: None,
            },
            RunMode::Scrub => Self {
                biotypes: Some(vec!["True".to_string()]),
                reference_biotypes: default_reference_biotypes(),
                clean: CleanOptions {
                    sources_to_remove: Vec::new(),
                    ..CleanOptions::default()
                },
                merge_names: false,
                organism_prefix: None,
            },
            RunMode::Melt => Self {
                biotypes: None,
                reference_biotypes: default_reference_biotypes(),
                clean: CleanOptions::default(),
                merge_names: false,
                organism_prefix: None,
            },
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::for_mode(RunMode::Process)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessSummary {
    pub stages: Vec<StageSummary>,
    pub clean: CleanOutcome,
    pub biotype: Option<BiotypeOutcome>,
    pub delink: DelinkOutcome,
    pub merge: Option<MergeOutcome>,
    pub dedup: DedupOutcome,
    pub empties_removed: usize,
}

/// One run over one organism's identifier space. The store lives and dies
/// with the pipeline.
pub struct Pipeline<'r> {
    store: IdentifierStore,
    options: PipelineOptions,
    report: &'r mut dyn ReportSink,
    stages: Vec<StageSummary>,
}

impl<'r> Pipeline<'r> {
    pub fn new(options: PipelineOptions, report: &'r mut dyn ReportSink) -> Self {
        Self {
            store: IdentifierStore::new(),
            options,
            report,
            stages: Vec::new(),
        }
    }

    pub fn store(&self) -> &IdentifierStore {
        &self.store
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn load_wide<R: BufRead>(
        &mut self,
        reader: R,
        origin: &str,
    ) -> Result<LoadStats, IdMergeError> {
        let stats = loader::load_wide(&mut self.store, reader, origin)?;
        self.record(Stage::Load);
        Ok(stats)
    }

    pub fn load_reverse<R: BufRead>(
        &mut self,
        reader: R,
        origin: &str,
    ) -> Result<LoadStats, IdMergeError> {
        let stats = loader::load_reverse(&mut self.store, reader, origin)?;
        info!(origin, reference_rows = self.store.reverse_size(), "loaded reverse mappings");
        Ok(stats)
    }

    pub fn load_triplets<R: BufRead>(
        &mut self,
        reader: R,
        origin: &str,
    ) -> Result<LoadStats, IdMergeError> {
        let stats = loader::load_triplets(&mut self.store, reader, origin)?;
        self.record(Stage::Load);
        Ok(stats)
    }

    pub fn clean(&mut self) -> Result<CleanOutcome, IdMergeError> {
        let outcome = stages::clean(&mut self.store, &self.options.clean, self.report)?;
        self.record(Stage::Clean);
        Ok(outcome)
    }

    /// Entity and reference biotype filters. Without an entity allow-list only
    /// the reference rows are filtered and `None` is returned.
    pub fn biotype_filter(&mut self) -> Result<Option<BiotypeOutcome>, IdMergeError> {
        let Some(keep) = &self.options.biotypes else {
            let removed = stages::filter_reference(
                &mut self.store,
                &self.options.reference_biotypes,
                self.report,
            )?;
            info!(reference_removed = removed, "entity biotype filter disabled");
            return Ok(None);
        };
        let outcome = stages::biotype_filter(
            &mut self.store,
            keep,
            &self.options.reference_biotypes,
            self.report,
        )?;
        self.record(Stage::BiotypeFilter);
        Ok(Some(outcome))
    }

    /// Cleaning, biotype filter, delink, optional merge, dedup and removal of
    /// emptied entities, in that order.
    pub fn process(&mut self) -> Result<ProcessSummary, IdMergeError> {
        let clean = self.clean()?;
        let biotype = self.biotype_filter()?;

        let delink = stages::delink(&mut self.store, self.report)?;
        self.record(Stage::Delink);

        let merge = if self.options.merge_names {
            let outcome = stages::merge_by_name(&mut self.store, self.report)?;
            self.record(Stage::Merge);
            Some(outcome)
        } else {
            info!("gene name merging disabled for this run");
            None
        };

        let dedup = stages::dedup(&mut self.store, self.report)?;
        self.record(Stage::Dedup);

        let empties_removed = stages::clean_empties(&mut self.store, self.report)?;
        self.record(Stage::CleanEmpties);

        Ok(ProcessSummary {
            stages: self.stages.clone(),
            clean,
            biotype,
            delink,
            merge,
            dedup,
            empties_removed,
        })
    }

    /// Cleaning and the optional biotype filter only.
    pub fn melt(&mut self) -> Result<ProcessSummary, IdMergeError> {
        let clean = self.clean()?;
        let biotype = self.biotype_filter()?;
        Ok(ProcessSummary {
            stages: self.stages.clone(),
            clean,
            biotype,
            ..ProcessSummary::default()
        })
    }

    pub fn validate(&self) -> Result<(), IdMergeError> {
        validate::validate(&self.store)
    }

    pub fn export<W: Write>(&self, writer: &mut W) -> Result<usize, IdMergeError> {
        export::export_processed(&self.store, writer, self.options.organism_prefix.as_ref())
    }

    pub fn export_descriptions<W: Write>(&self, writer: &mut W) -> Result<usize, IdMergeError> {
        export::export_descriptions(&self.store, writer)
    }

    pub fn stages(&self) -> &[StageSummary] {
        &self.stages
    }

    pub fn flush_report(&mut self) -> Result<(), IdMergeError> {
        self.report.flush()
    }

    fn record(&mut self, stage: Stage) {
        let summary = StageSummary {
            stage,
            symbols: self.store.symbols_size(),
            entities: self.store.entities_size(),
        };
        info!(
            stage = ?stage,
            symbols = summary.symbols,
            entities = summary.entities,
            "stage complete"
        );
        self.stages.push(summary);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::report::{MemoryReport, NullReport};

    const WIDE: &str = "GMID\tGene Name\tProtein Coding\tSynonyms\tDefinition\n\
                        1\thappy\tTrue\tsilly;putty\thappy gene\n\
                        2\tsad\tprotein_coding\tserious;putty;sad\tsad gene\n\
                        3\thappy\tTrue\tnaughty\tanother happy gene\n";

    #[test]
    fn process_records_each_stage() {
        let mut report = MemoryReport::default();
        let mut pipeline = Pipeline::new(PipelineOptions::default(), &mut report);
        pipeline.load_wide(Cursor::new(WIDE), "wide").unwrap();
        let summary = pipeline.process().unwrap();
        pipeline.validate().unwrap();

        let stages = summary
            .stages
            .iter()
            .map(|summary| summary.stage)
            .collect::<Vec<_>>();
        assert_eq!(
            stages,
            vec![
                Stage::Load,
                Stage::Clean,
                Stage::BiotypeFilter,
                Stage::Delink,
                Stage::Merge,
                Stage::Dedup,
                Stage::CleanEmpties,
            ]
        );
        assert_eq!(summary.merge.unwrap().entities_removed, 1);
        assert_eq!(pipeline.store().entities_size(), 2);
        assert!(report.contains("happy"));
    }

    #[test]
    fn merge_disabled_keeps_homonyms_apart() {
        let options = PipelineOptions {
            merge_names: false,
            ..PipelineOptions::default()
        };
        let mut report = NullReport;
        let mut pipeline = Pipeline::new(options, &mut report);
        pipeline.load_wide(Cursor::new(WIDE), "wide").unwrap();
        let summary = pipeline.process().unwrap();

        assert!(summary.merge.is_none());
        // "happy" collided across entities 1 and 3 and was dropped from both
        assert!(pipeline.store().rows_for_symbol("happy").is_empty());
        pipeline.validate().unwrap();
    }
}
