use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IdMergeError {
    #[error("{origin}:{line}: malformed row, expected {expected} columns but found {found}")]
    #[diagnostic(help("identifier inputs are tab-delimited; every row must match the header"))]
    MalformedRow {
        origin: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{origin}: missing required column '{column}' in header")]
    MissingColumn { origin: String, column: String },

    #[error("{origin}: empty input, no header row")]
    MissingHeader { origin: String },

    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error("duplicate entity id: {0}")]
    DuplicateEntity(u64),

    #[error("invalid organism prefix: {0}")]
    InvalidOrganismPrefix(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("symbols are not unique: total {total} not equal to unique {unique}")]
    #[diagnostic(code(kira_idm::validate::unique))]
    DuplicateSymbols { total: usize, unique: usize },

    #[error("{0} entities have no symbols at all")]
    #[diagnostic(code(kira_idm::validate::orphans))]
    OrphanEntities(usize),

    #[error("{0} entities have more than one gene name")]
    #[diagnostic(code(kira_idm::validate::gene_names))]
    MultipleGeneNames(usize),

    #[error("failed to write report: {0}")]
    Report(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl IdMergeError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IdMergeError::DuplicateSymbols { .. }
                | IdMergeError::OrphanEntities(_)
                | IdMergeError::MultipleGeneNames(_)
        )
    }

    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            IdMergeError::MalformedRow { .. }
                | IdMergeError::MissingColumn { .. }
                | IdMergeError::MissingHeader { .. }
                | IdMergeError::InvalidEntityId(_)
                | IdMergeError::DuplicateEntity(_)
        )
    }
}
