use crate::error::IdMergeError;
use crate::store::IdentifierStore;

/// Post-conditions of a processed identifier space. Any violation aborts the
/// run.
pub fn validate(store: &IdentifierStore) -> Result<(), IdMergeError> {
    let total = store.symbols_size();
    let unique = store.distinct_symbols();
    if total != unique {
        return Err(IdMergeError::DuplicateSymbols { total, unique });
    }

    let orphans = store.entities_without_symbols().len();
    if orphans > 0 {
        return Err(IdMergeError::OrphanEntities(orphans));
    }

    let multiple_names = store
        .entities()
        .filter(|entity| store.gene_name_count(entity.id) > 1)
        .count();
    if multiple_names > 0 {
        return Err(IdMergeError::MultipleGeneNames(multiple_names));
    }

    Ok(())
}
