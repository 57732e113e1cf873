use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::EntityId;
use crate::error::IdMergeError;
use crate::report::ReportSink;
use crate::store::IdentifierStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BiotypeOutcome {
    pub symbols_removed: usize,
    pub entities_removed: usize,
    pub reverse_removed: usize,
}

/// Removes entities whose biotype is not in `keep`, together with their
/// symbols, and reference rows whose biotype is not in `reference_keep`.
pub fn biotype_filter(
    store: &mut IdentifierStore,
    keep: &[String],
    reference_keep: &[String],
    report: &mut dyn ReportSink,
) -> Result<BiotypeOutcome, IdMergeError> {
    let (symbols_removed, entities_removed) = filter_entities(store, keep, report)?;
    let reverse_removed = filter_reference(store, reference_keep, report)?;
    Ok(BiotypeOutcome {
        symbols_removed,
        entities_removed,
        reverse_removed,
    })
}

/// Entity part of the filter. Entities with an unknown biotype (triplet
/// input) are left alone. Returns `(symbols removed, entities removed)`.
pub fn filter_entities(
    store: &mut IdentifierStore,
    keep: &[String],
    report: &mut dyn ReportSink,
) -> Result<(usize, usize), IdMergeError> {
    let disqualified = store
        .entities()
        .filter(|entity| {
            entity
                .biotype
                .as_ref()
                .is_some_and(|biotype| !keep.contains(biotype))
        })
        .map(|entity| entity.id)
        .collect::<BTreeSet<EntityId>>();

    // symbols first, ownership is resolved through the entity biotype
    let symbols_removed = store.delete_symbols_where(|row| disqualified.contains(&row.entity));
    let entities_removed = store.delete_entities(disqualified);

    report.line(&format!(
        "applying biotype filters ({}), total records removed: {entities_removed}, symbols removed: {symbols_removed}",
        quoted(keep)
    ))?;
    Ok((symbols_removed, entities_removed))
}

/// Reference part of the filter. Runs even when the entity allow-list is
/// disabled.
pub fn filter_reference(
    store: &mut IdentifierStore,
    reference_keep: &[String],
    report: &mut dyn ReportSink,
) -> Result<usize, IdMergeError> {
    let reverse_removed =
        store.retain_reverse(|mapping| reference_keep.contains(&mapping.biotype));
    report.line(&format!(
        "applying reference biotype filters ({}), reference rows removed: {reverse_removed}",
        quoted(reference_keep)
    ))?;
    Ok(reverse_removed)
}

fn quoted(values: &[String]) -> String {
    values
        .iter()
        .map(|value| format!("'{value}'"))
        .collect::<Vec<_>>()
        .join(",")
}
