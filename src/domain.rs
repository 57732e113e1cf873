use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::IdMergeError;

/// Column and source names used by the identifier exports.
pub mod sources {
    pub const GMID: &str = "GMID";
    pub const DEFINITION: &str = "Definition";
    /// Biotype column of the wide format. The header name is historical.
    pub const BIOTYPE: &str = "Protein Coding";

    pub const GENE_NAME: &str = "Gene Name";
    pub const SYNONYM: &str = "Synonym";
    pub const SYNONYM_ORIG: &str = "Synonyms";
    pub const ENTREZ_GENE_ID: &str = "Entrez Gene ID";
    pub const ENSEMBL_GENE_ID: &str = "Ensembl Gene ID";
    pub const ENSEMBL_TRANSCRIPT_ID: &str = "Ensembl Transcript ID";

    /// Columns of the wide format that are taken verbatim instead of split on `;`.
    pub const NON_DELIMITED: &[&str] = &[GENE_NAME];

    pub const REV_ENTREZ_ID: &str = "GeneID";
    pub const REV_GENE_NAME: &str = "Symbol";
    pub const REV_XREFS: &str = "dbXrefs";
    pub const REV_BIOTYPE: &str = "type_of_gene";
    pub const REV_ENSEMBL: &str = "Ensembl";

    pub const MISSING: &str = "N/A";
}

pub fn default_biotypes() -> Vec<String> {
    vec!["protein_coding".to_string(), "True".to_string()]
}

pub fn default_reference_biotypes() -> Vec<String> {
    vec!["protein-coding".to_string()]
}

pub fn default_sources_to_remove() -> Vec<String> {
    vec![sources::ENSEMBL_TRANSCRIPT_ID.to_string()]
}

pub fn default_synonym_aliases() -> Vec<String> {
    vec![sources::SYNONYM_ORIG.to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdMergeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdMergeError::InvalidEntityId(value.to_string()))
    }
}

/// Insertion-ordered handle of a symbol row. Lower ids were loaded earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl RowId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Case-folded form of a symbol. All symbol comparisons go through this key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolKey(String);

impl SymbolKey {
    pub fn new(symbol: &str) -> Self {
        Self(symbol.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SymbolKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    /// `None` for entities that only appeared in triplet input.
    pub biotype: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRow {
    pub row_id: RowId,
    pub entity: EntityId,
    pub symbol: String,
    pub source: String,
}

impl SymbolRow {
    pub fn key(&self) -> SymbolKey {
        SymbolKey::new(&self.symbol)
    }

    pub fn is_source(&self, source: &str) -> bool {
        self.source == source
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSymbol {
    pub entity: EntityId,
    pub symbol: String,
    pub source: String,
}

impl NewSymbol {
    pub fn new(entity: EntityId, symbol: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            entity,
            symbol: symbol.into(),
            source: source.into(),
        }
    }
}

/// Trusted entrez to ensembl cross-reference. Only used to disambiguate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseMapping {
    pub entrez_id: String,
    pub name: String,
    pub ensembl_id: String,
    pub biotype: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triplet {
    pub entity: EntityId,
    pub symbol: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganismPrefix(String);

impl OrganismPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganismPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrganismPrefix {
    type Err = IdMergeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let pattern = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$")
            .map_err(|err| IdMergeError::InvalidOrganismPrefix(err.to_string()))?;
        if !pattern.is_match(normalized) {
            return Err(IdMergeError::InvalidOrganismPrefix(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}
