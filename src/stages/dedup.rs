//! Symbol collision removal in three tiers, applied in order:
//! synonyms that clash with any other source, symbols shared by different
//! entities, and repeated symbols within one entity.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{EntityId, RowId, sources};
use crate::error::IdMergeError;
use crate::report::ReportSink;
use crate::store::IdentifierStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupOutcome {
    pub synonyms_removed: usize,
    pub cross_entity_symbols: usize,
    pub cross_entity_removed: usize,
    pub within_entity_removed: usize,
}

pub fn dedup(
    store: &mut IdentifierStore,
    report: &mut dyn ReportSink,
) -> Result<DedupOutcome, IdMergeError> {
    let synonyms_removed = dedup_synonyms(store, report)?;
    let (cross_entity_symbols, cross_entity_removed) = dedup_between_entities(store, report)?;
    let within_entity_removed = dedup_within_entities(store, report)?;
    Ok(DedupOutcome {
        synonyms_removed,
        cross_entity_symbols,
        cross_entity_removed,
        within_entity_removed,
    })
}

/// Removes synonyms colliding with a symbol of any other source. The
/// non-synonym is kept.
pub fn dedup_synonyms(
    store: &mut IdentifierStore,
    report: &mut dyn ReportSink,
) -> Result<usize, IdMergeError> {
    let mut doomed = BTreeMap::<RowId, String>::new();
    for (_, rows) in store.symbol_groups() {
        if !rows.iter().any(|row| !row.is_source(sources::SYNONYM)) {
            continue;
        }
        for row in rows.iter().filter(|row| row.is_source(sources::SYNONYM)) {
            doomed.insert(row.row_id, row.symbol.clone());
        }
    }

    report.line(&format!(
        "removing {} synonyms for conflict with non-synonyms:",
        doomed.len()
    ))?;
    let mut symbols = doomed.values().cloned().collect::<Vec<_>>();
    symbols.sort();
    report.lines(&symbols)?;

    Ok(store.delete_symbols(doomed.into_keys()))
}

/// Removes every copy of a symbol owned by more than one entity. Returns the
/// number of distinct symbols dropped and the number of rows removed.
pub fn dedup_between_entities(
    store: &mut IdentifierStore,
    report: &mut dyn ReportSink,
) -> Result<(usize, usize), IdMergeError> {
    let mut symbols = Vec::new();
    let mut doomed = Vec::new();
    for (_, rows) in store.symbol_groups() {
        let owners = rows.iter().map(|row| row.entity).collect::<BTreeSet<_>>();
        if owners.len() < 2 {
            continue;
        }
        if let Some(first) = rows.iter().min_by_key(|row| row.row_id) {
            symbols.push(first.symbol.clone());
        }
        doomed.extend(rows.iter().map(|row| row.row_id));
    }
    symbols.sort();

    report.line(&format!(
        "removing {} symbols for conflict between different genes",
        symbols.len()
    ))?;
    report.lines(&symbols)?;

    let removed = store.delete_symbols(doomed);
    Ok((symbols.len(), removed))
}

/// Keeps the earliest row of each symbol repeated inside one entity.
pub fn dedup_within_entities(
    store: &mut IdentifierStore,
    report: &mut dyn ReportSink,
) -> Result<usize, IdMergeError> {
    let mut doomed = Vec::new();
    for (_, rows) in store.symbol_groups() {
        if rows.len() < 2 {
            continue;
        }
        let mut by_entity = BTreeMap::<EntityId, Vec<RowId>>::new();
        for row in &rows {
            by_entity.entry(row.entity).or_default().push(row.row_id);
        }
        for mut ids in by_entity.into_values() {
            ids.sort();
            doomed.extend(ids.into_iter().skip(1));
        }
    }

    let removed = store.delete_symbols(doomed);
    report.line(&format!(
        "removing {removed} duplicate symbols within the same gene"
    ))?;
    Ok(removed)
}
