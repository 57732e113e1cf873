use std::io::BufRead;

use serde::Serialize;
use tracing::debug;

use crate::domain::{NewSymbol, ReverseMapping, sources};
use crate::error::IdMergeError;
use crate::parser::{ReverseReader, TripletReader, WideReader};
use crate::store::{INSERT_BATCH_SIZE, IdentifierStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub records: usize,
    pub rows: usize,
}

/// Fixed-size insert buffer in front of the store. Anything still buffered is
/// written by [`SymbolBatch::finish`].
struct SymbolBatch {
    pending: Vec<NewSymbol>,
    flushed: usize,
}

impl SymbolBatch {
    fn new() -> Self {
        Self {
            pending: Vec::with_capacity(INSERT_BATCH_SIZE),
            flushed: 0,
        }
    }

    fn push(&mut self, store: &mut IdentifierStore, symbol: NewSymbol) {
        self.pending.push(symbol);
        if self.pending.len() >= INSERT_BATCH_SIZE {
            self.flush(store);
        }
    }

    fn flush(&mut self, store: &mut IdentifierStore) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(INSERT_BATCH_SIZE));
        self.flushed += store.add_symbols(batch);
    }

    fn finish(mut self, store: &mut IdentifierStore) -> usize {
        self.flush(store);
        self.flushed
    }
}

/// Loads a wide multi-source export: one entity per row, one symbol row per
/// cell value.
pub fn load_wide<R: BufRead>(
    store: &mut IdentifierStore,
    reader: R,
    origin: &str,
) -> Result<LoadStats, IdMergeError> {
    let records = WideReader::new(reader, origin)?;
    let mut batch = SymbolBatch::new();
    let mut stats = LoadStats::default();

    for record in records {
        let record = record?;
        store.add_entity(record.id, record.biotype, record.description)?;
        for (symbol, source) in record.symbols {
            batch.push(store, NewSymbol::new(record.id, symbol, source));
        }
        stats.records += 1;
    }

    stats.rows = batch.finish(store);
    debug!(origin, records = stats.records, rows = stats.rows, "loaded wide identifiers");
    Ok(stats)
}

/// Loads entrez gene info rows, one reference tuple per ensembl cross-reference.
pub fn load_reverse<R: BufRead>(
    store: &mut IdentifierStore,
    reader: R,
    origin: &str,
) -> Result<LoadStats, IdMergeError> {
    let records = ReverseReader::new(reader, origin)?;
    let mut pending = Vec::with_capacity(INSERT_BATCH_SIZE);
    let mut stats = LoadStats::default();

    for record in records {
        let record = record?;
        for ensembl in record.xrefs(sources::REV_ENSEMBL) {
            pending.push(ReverseMapping {
                entrez_id: record.entrez_id.clone(),
                name: record.name.clone(),
                ensembl_id: ensembl.to_string(),
                biotype: record.biotype.clone(),
            });
        }
        stats.records += 1;
        if pending.len() >= INSERT_BATCH_SIZE {
            stats.rows += pending.len();
            store.add_reverse_mappings(pending.drain(..));
        }
    }
    if !pending.is_empty() {
        stats.rows += pending.len();
        store.add_reverse_mappings(pending);
    }

    debug!(origin, records = stats.records, rows = stats.rows, "loaded reverse mappings");
    Ok(stats)
}

/// Loads `id, symbol, source` triplets. Entities seen here carry no biotype.
pub fn load_triplets<R: BufRead>(
    store: &mut IdentifierStore,
    reader: R,
    origin: &str,
) -> Result<LoadStats, IdMergeError> {
    let mut batch = SymbolBatch::new();
    let mut stats = LoadStats::default();

    for record in TripletReader::new(reader, origin) {
        let record = record?;
        store.ensure_entity(record.id);
        batch.push(store, NewSymbol::new(record.id, record.symbol, record.source));
        stats.records += 1;
    }

    stats.rows = batch.finish(store);
    debug!(origin, records = stats.records, rows = stats.rows, "loaded triplets");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::EntityId;

    #[test]
    fn wide_load_flushes_partial_batch() {
        let mut data = String::from("GMID\tGene Name\tProtein Coding\tSynonyms\tDefinition\n");
        for idx in 1..=60 {
            data.push_str(&format!("{idx}\tgene{idx}\tTrue\ta{idx};b{idx}\tdesc\n"));
        }
        let mut store = IdentifierStore::new();
        let stats = load_wide(&mut store, Cursor::new(data), "wide").unwrap();

        assert_eq!(stats.records, 60);
        assert_eq!(stats.rows, 180);
        assert_eq!(store.symbols_size(), 180);
        assert_eq!(store.entities_size(), 60);
    }

    #[test]
    fn reverse_load_emits_one_tuple_per_ensembl_xref() {
        let data = "GeneID\tSymbol\tSynonyms\tdbXrefs\tdescription\ttype_of_gene\n\
                    8\tgene_8\t\tEnsembl:ENSG07|Ensembl:ENSG08\t\tprotein-coding\n\
                    2\tgene_2\t\tHGNC:2\t\tprotein-coding\n";
        let mut store = IdentifierStore::new();
        let stats = load_reverse(&mut store, Cursor::new(data), "reverse").unwrap();

        assert_eq!(stats.records, 2);
        assert_eq!(store.reverse_size(), 2);
        assert!(store.reverse_agrees("ENSG08", "8"));
    }

    #[test]
    fn triplet_load_registers_untyped_entities() {
        let data = "4\tTP53\tGene Name\n4\tp53\tSynonym\n";
        let mut store = IdentifierStore::new();
        load_triplets(&mut store, Cursor::new(data), "triplets").unwrap();

        let entity = store.entity(EntityId::new(4)).unwrap();
        assert_eq!(entity.biotype, None);
        assert_eq!(store.symbols_size(), 2);
    }

    #[test]
    fn duplicate_gmid_aborts_load() {
        let data = "GMID\tGene Name\tProtein Coding\tDefinition\n1\ta\tTrue\t\n1\tb\tTrue\t\n";
        let mut store = IdentifierStore::new();
        let err = load_wide(&mut store, Cursor::new(data), "dup").unwrap_err();
        assert_matches!(err, IdMergeError::DuplicateEntity(1));
    }
}
