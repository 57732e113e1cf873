//! Audit report sink. Every stage appends the decisions it made here so an
//! operator can see what was discarded without re-running the algorithm.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::IdMergeError;

pub trait ReportSink {
    fn line(&mut self, line: &str) -> Result<(), IdMergeError>;

    fn lines(&mut self, lines: &[String]) -> Result<(), IdMergeError> {
        for line in lines {
            self.line(line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IdMergeError> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReport;

impl ReportSink for NullReport {
    fn line(&mut self, _line: &str) -> Result<(), IdMergeError> {
        Ok(())
    }
}

/// Collects report lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryReport {
    pub lines: Vec<String>,
}

impl MemoryReport {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl ReportSink for MemoryReport {
    fn line(&mut self, line: &str) -> Result<(), IdMergeError> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

pub struct WriterReport<W: Write> {
    writer: W,
}

impl<W: Write> WriterReport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterReport<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, IdMergeError> {
        let file = File::create(path).map_err(|err| {
            IdMergeError::Report(format!("create {}: {err}", path.display()))
        })?;
        let mut report = Self::new(BufWriter::new(file));
        report.line(&format!(
            "# kira-idm report, generated {}",
            chrono::Utc::now().to_rfc3339()
        ))?;
        Ok(report)
    }
}

impl<W: Write> ReportSink for WriterReport<W> {
    fn line(&mut self, line: &str) -> Result<(), IdMergeError> {
        writeln!(self.writer, "{line}").map_err(|err| IdMergeError::Report(err.to_string()))
    }

    fn flush(&mut self) -> Result<(), IdMergeError> {
        self.writer
            .flush()
            .map_err(|err| IdMergeError::Report(err.to_string()))
    }
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn line(&mut self, line: &str) -> Result<(), IdMergeError> {
        (**self).line(line)
    }

    fn flush(&mut self) -> Result<(), IdMergeError> {
        (**self).flush()
    }
}

impl<T: ReportSink + ?Sized> ReportSink for Box<T> {
    fn line(&mut self, line: &str) -> Result<(), IdMergeError> {
        (**self).line(line)
    }

    fn flush(&mut self) -> Result<(), IdMergeError> {
        (**self).flush()
    }
}
