use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

use crate::config::{DEFAULT_CONFIG_FILE, starter_config};
use crate::error::IdMergeError;
use crate::fs_util::{AtomicFile, open_input};
use crate::loader::LoadStats;
use crate::pipeline::{Pipeline, PipelineOptions, ProcessSummary, RunMode};
use crate::report::{NullReport, ReportSink, WriterReport};

#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub raw: Utf8PathBuf,
    pub reverse: Option<Utf8PathBuf>,
    pub output: Utf8PathBuf,
    pub report: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ScrubRequest {
    pub inputs: Vec<Utf8PathBuf>,
    pub output: Utf8PathBuf,
    pub report: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MeltRequest {
    pub raw: Utf8PathBuf,
    pub symbols: Utf8PathBuf,
    pub descriptions: Utf8PathBuf,
    pub report: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadedInput {
    pub path: String,
    pub records: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenOutput {
    pub path: String,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub mode: RunMode,
    pub inputs: Vec<LoadedInput>,
    pub summary: ProcessSummary,
    pub outputs: Vec<WrittenOutput>,
    pub symbols: usize,
    pub entities: usize,
    pub report: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitResult {
    pub path: String,
}

/// Whole-run entry points. Outputs are staged in temporary files and only
/// moved into place after the run succeeded.
#[derive(Debug, Clone)]
pub struct App {
    options: PipelineOptions,
}

impl App {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn process(&self, request: &ProcessRequest) -> Result<RunResult, IdMergeError> {
        let mut report = open_report(request.report.as_deref())?;
        let mut pipeline = Pipeline::new(self.options.clone(), &mut report);

        let mut inputs = vec![loaded(
            &request.raw,
            pipeline.load_wide(open_input(&request.raw)?, request.raw.as_str())?,
        )];
        if let Some(reverse) = &request.reverse {
            let stats = pipeline.load_reverse(open_input(reverse)?, reverse.as_str())?;
            inputs.push(loaded(reverse, stats));
        }

        let summary = pipeline.process()?;
        pipeline.validate()?;

        let mut output = AtomicFile::create(&request.output)?;
        let lines = pipeline.export(&mut output)?;
        let (symbols, entities) = sizes(&pipeline);
        pipeline.flush_report()?;
        let path = output.commit()?;
        info!(path = %path, lines, "wrote processed identifiers");

        Ok(RunResult {
            mode: RunMode::Process,
            inputs,
            summary,
            outputs: vec![WrittenOutput {
                path: path.to_string(),
                lines,
            }],
            symbols,
            entities,
            report: request.report.as_ref().map(|path| path.to_string()),
        })
    }

    pub fn scrub(&self, request: &ScrubRequest) -> Result<RunResult, IdMergeError> {
        let mut report = open_report(request.report.as_deref())?;
        let mut pipeline = Pipeline::new(self.options.clone(), &mut report);

        let mut inputs = Vec::with_capacity(request.inputs.len());
        for path in &request.inputs {
            let stats = pipeline.load_triplets(open_input(path)?, path.as_str())?;
            inputs.push(loaded(path, stats));
        }

        let summary = pipeline.process()?;
        pipeline.validate()?;

        let mut output = AtomicFile::create(&request.output)?;
        let lines = pipeline.export(&mut output)?;
        let (symbols, entities) = sizes(&pipeline);
        pipeline.flush_report()?;
        let path = output.commit()?;
        info!(path = %path, lines, "wrote scrubbed identifiers");

        Ok(RunResult {
            mode: RunMode::Scrub,
            inputs,
            summary,
            outputs: vec![WrittenOutput {
                path: path.to_string(),
                lines,
            }],
            symbols,
            entities,
            report: request.report.as_ref().map(|path| path.to_string()),
        })
    }

    pub fn melt(&self, request: &MeltRequest) -> Result<RunResult, IdMergeError> {
        let mut report = open_report(request.report.as_deref())?;
        let mut pipeline = Pipeline::new(self.options.clone(), &mut report);

        let stats = pipeline.load_wide(open_input(&request.raw)?, request.raw.as_str())?;
        let inputs = vec![loaded(&request.raw, stats)];
        let summary = pipeline.melt()?;

        let mut symbols_out = AtomicFile::create(&request.symbols)?;
        let symbol_lines = pipeline.export(&mut symbols_out)?;
        let mut descriptions_out = AtomicFile::create(&request.descriptions)?;
        let description_lines = pipeline.export_descriptions(&mut descriptions_out)?;
        let (symbols, entities) = sizes(&pipeline);
        pipeline.flush_report()?;

        let committed = AtomicFile::commit_all(vec![symbols_out, descriptions_out])?;
        let outputs = committed
            .into_iter()
            .zip([symbol_lines, description_lines])
            .map(|(path, lines)| WrittenOutput {
                path: path.to_string(),
                lines,
            })
            .collect::<Vec<_>>();
        info!(
            symbols = %request.symbols,
            descriptions = %request.descriptions,
            "wrote melted identifiers"
        );

        Ok(RunResult {
            mode: RunMode::Melt,
            inputs,
            summary,
            outputs,
            symbols,
            entities,
            report: request.report.as_ref().map(|path| path.to_string()),
        })
    }

    /// Writes a starter config with the process-mode defaults.
    pub fn init(dest: Option<&Utf8Path>, force: bool) -> Result<InitResult, IdMergeError> {
        let dest = dest.unwrap_or(Utf8Path::new(DEFAULT_CONFIG_FILE));
        if dest.exists() && !force {
            return Err(IdMergeError::Filesystem(format!(
                "{dest} already exists (use --force to overwrite)"
            )));
        }
        let json = serde_json::to_string_pretty(&starter_config())
            .map_err(|err| IdMergeError::ConfigParse(err.to_string()))?;
        let mut file = AtomicFile::create(dest)?;
        writeln!(file, "{json}").map_err(|err| IdMergeError::Filesystem(err.to_string()))?;
        let path = file.commit()?;
        Ok(InitResult {
            path: path.to_string(),
        })
    }
}

fn open_report(path: Option<&Utf8Path>) -> Result<Box<dyn ReportSink>, IdMergeError> {
    match path {
        Some(path) => Ok(Box::new(WriterReport::create(path.as_std_path())?)),
        None => Ok(Box::new(NullReport)),
    }
}

fn loaded(path: &Utf8Path, stats: LoadStats) -> LoadedInput {
    LoadedInput {
        path: path.to_string(),
        records: stats.records,
        rows: stats.rows,
    }
}

fn sizes(pipeline: &Pipeline<'_>) -> (usize, usize) {
    (
        pipeline.store().symbols_size(),
        pipeline.store().entities_size(),
    )
}
