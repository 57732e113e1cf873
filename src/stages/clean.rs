use serde::Serialize;

use crate::domain::{
    SymbolKey, SymbolRow, default_sources_to_remove, default_synonym_aliases, sources,
};
use crate::error::IdMergeError;
use crate::report::ReportSink;
use crate::store::IdentifierStore;

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub sources_to_remove: Vec<String>,
    /// Alternate header spellings of the synonym source.
    pub synonym_aliases: Vec<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            sources_to_remove: default_sources_to_remove(),
            synonym_aliases: default_synonym_aliases(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanOutcome {
    pub placeholders_removed: usize,
    pub blacklisted_removed: usize,
    pub sources_renamed: usize,
}

/// Empty, `N/A` or whitespace-bearing symbols are not identifiers.
pub fn is_placeholder(row: &SymbolRow) -> bool {
    row.symbol.is_empty()
        || SymbolKey::new(&row.symbol) == SymbolKey::new(sources::MISSING)
        || row.symbol.chars().any(char::is_whitespace)
}

pub fn remove_placeholders(store: &mut IdentifierStore) -> usize {
    store.delete_symbols_where(is_placeholder)
}

pub fn remove_sources(store: &mut IdentifierStore, blacklist: &[String]) -> usize {
    if blacklist.is_empty() {
        return 0;
    }
    store.delete_symbols_where(|row| blacklist.iter().any(|source| row.source == *source))
}

pub fn standardize_source_names(store: &mut IdentifierStore, aliases: &[String]) -> usize {
    aliases
        .iter()
        .filter(|alias| alias.as_str() != sources::SYNONYM)
        .map(|alias| store.rename_source(alias, sources::SYNONYM))
        .sum()
}

/// Placeholder removal, source blacklist and source renaming. Idempotent.
pub fn clean(
    store: &mut IdentifierStore,
    options: &CleanOptions,
    report: &mut dyn ReportSink,
) -> Result<CleanOutcome, IdMergeError> {
    let outcome = CleanOutcome {
        placeholders_removed: remove_placeholders(store),
        blacklisted_removed: remove_sources(store, &options.sources_to_remove),
        sources_renamed: standardize_source_names(store, &options.synonym_aliases),
    };

    report.line(&format!(
        "removed {} empty or malformed symbols",
        outcome.placeholders_removed
    ))?;
    if !options.sources_to_remove.is_empty() {
        report.line(&format!(
            "removed {} symbols from ignored sources ({})",
            outcome.blacklisted_removed,
            options.sources_to_remove.join(", ")
        ))?;
    }
    Ok(outcome)
}

/// Drops entities left without any symbol.
pub fn clean_empties(
    store: &mut IdentifierStore,
    report: &mut dyn ReportSink,
) -> Result<usize, IdMergeError> {
    let empties = store.entities_without_symbols();
    let removed = store.delete_entities(empties);
    report.line(&format!("removed {removed} entities left without symbols"))?;
    Ok(removed)
}
