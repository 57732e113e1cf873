use std::io::Write;

use crate::domain::{OrganismPrefix, sources};
use crate::error::IdMergeError;
use crate::store::IdentifierStore;

/// Writes `entity<TAB>symbol<TAB>source` lines ordered by
/// `(entity, source, symbol)`. With a prefix the entity field becomes
/// `prefix:entity`. Returns the number of lines written.
pub fn export_processed<W: Write>(
    store: &IdentifierStore,
    writer: &mut W,
    prefix: Option<&OrganismPrefix>,
) -> Result<usize, IdMergeError> {
    let triplets = store.sorted_triplets();
    for triplet in &triplets {
        let result = match prefix {
            Some(prefix) => writeln!(
                writer,
                "{prefix}:{}\t{}\t{}",
                triplet.entity, triplet.symbol, triplet.source
            ),
            None => writeln!(
                writer,
                "{}\t{}\t{}",
                triplet.entity, triplet.symbol, triplet.source
            ),
        };
        result.map_err(|err| IdMergeError::Filesystem(err.to_string()))?;
    }
    Ok(triplets.len())
}

/// Writes `entity<TAB>description` for every entity in id order. The missing
/// value placeholder becomes an empty description.
pub fn export_descriptions<W: Write>(
    store: &IdentifierStore,
    writer: &mut W,
) -> Result<usize, IdMergeError> {
    let mut written = 0;
    for entity in store.entities() {
        let description = entity
            .description
            .as_deref()
            .filter(|description| *description != sources::MISSING)
            .unwrap_or("");
        writeln!(writer, "{}\t{description}", entity.id)
            .map_err(|err| IdMergeError::Filesystem(err.to_string()))?;
        written += 1;
    }
    Ok(written)
}
