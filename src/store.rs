use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{
    Entity, EntityId, NewSymbol, ReverseMapping, RowId, SymbolKey, SymbolRow, Triplet, sources,
};
use crate::error::IdMergeError;

/// Rows are buffered and flushed into the store in batches of this size.
pub const INSERT_BATCH_SIZE: usize = 100;

/// In-memory identifier tables for a single pipeline run.
///
/// Three tables mirror the relational layout of the identifier space:
/// `symbols` keyed by insertion-ordered [`RowId`], `entities` keyed by
/// [`EntityId`], and the read-only `entrez_to_ensembl` reference. The
/// case-insensitive symbol index and the entity index are kept in step with
/// every mutation; the reference indexes are rebuilt whenever the reference
/// table changes.
#[derive(Debug, Default)]
pub struct IdentifierStore {
    entities: BTreeMap<EntityId, Entity>,
    symbols: BTreeMap<RowId, SymbolRow>,
    next_row: u64,
    by_symbol: HashMap<SymbolKey, BTreeSet<RowId>>,
    by_entity: HashMap<EntityId, BTreeSet<RowId>>,
    reverse: Vec<ReverseMapping>,
    reverse_by_entrez: HashMap<SymbolKey, Vec<usize>>,
    reverse_by_ensembl: HashMap<SymbolKey, Vec<usize>>,
}

impl IdentifierStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(
        &mut self,
        id: EntityId,
        biotype: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), IdMergeError> {
        if self.entities.contains_key(&id) {
            return Err(IdMergeError::DuplicateEntity(id.get()));
        }
        self.entities.insert(
            id,
            Entity {
                id,
                biotype: Some(biotype.into()),
                description: Some(description.into()),
            },
        );
        Ok(())
    }

    /// Registers an entity with unknown biotype unless it already exists.
    pub fn ensure_entity(&mut self, id: EntityId) {
        self.entities.entry(id).or_insert(Entity {
            id,
            biotype: None,
            description: None,
        });
    }

    pub fn add_symbols(&mut self, batch: impl IntoIterator<Item = NewSymbol>) -> usize {
        let mut added = 0;
        for new in batch {
            self.next_row += 1;
            let row_id = RowId::new(self.next_row);
            self.index_row(row_id, new.entity, &new.symbol);
            self.symbols.insert(
                row_id,
                SymbolRow {
                    row_id,
                    entity: new.entity,
                    symbol: new.symbol,
                    source: new.source,
                },
            );
            added += 1;
        }
        added
    }

    pub fn add_reverse_mappings(&mut self, batch: impl IntoIterator<Item = ReverseMapping>) {
        let start = self.reverse.len();
        self.reverse.extend(batch);
        self.index_reverse(start);
    }

    pub fn symbols_size(&self) -> usize {
        self.symbols.len()
    }

    pub fn entities_size(&self) -> usize {
        self.entities.len()
    }

    pub fn reverse_size(&self) -> usize {
        self.reverse.len()
    }

    pub fn distinct_symbols(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn symbol(&self, row: RowId) -> Option<&SymbolRow> {
        self.symbols.get(&row)
    }

    /// All symbol rows in load order.
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolRow> {
        self.symbols.values()
    }

    pub fn reverse_mappings(&self) -> &[ReverseMapping] {
        &self.reverse
    }

    /// Rows matching `symbol` case-insensitively, in export order.
    pub fn rows_for_symbol(&self, symbol: &str) -> Vec<&SymbolRow> {
        let mut rows = self
            .by_symbol
            .get(&SymbolKey::new(symbol))
            .into_iter()
            .flatten()
            .filter_map(|row| self.symbols.get(row))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| export_order(a, b));
        rows
    }

    pub fn rows_for_entity(&self, id: EntityId) -> impl Iterator<Item = &SymbolRow> {
        self.by_entity
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|row| self.symbols.get(row))
    }

    /// Case-insensitive symbol groups with the rows sharing each key.
    pub fn symbol_groups(&self) -> impl Iterator<Item = (&SymbolKey, Vec<&SymbolRow>)> {
        self.by_symbol.iter().map(|(key, rows)| {
            (
                key,
                rows.iter()
                    .filter_map(|row| self.symbols.get(row))
                    .collect::<Vec<_>>(),
            )
        })
    }

    /// Reference rows whose ensembl id matches `ensembl_id` case-insensitively.
    pub fn reverse_for_ensembl(&self, ensembl_id: &str) -> impl Iterator<Item = &ReverseMapping> {
        self.reverse_by_ensembl
            .get(&SymbolKey::new(ensembl_id))
            .into_iter()
            .flatten()
            .map(|idx| &self.reverse[*idx])
    }

    pub fn reverse_for_entrez(&self, entrez_id: &str) -> impl Iterator<Item = &ReverseMapping> {
        self.reverse_by_entrez
            .get(&SymbolKey::new(entrez_id))
            .into_iter()
            .flatten()
            .map(|idx| &self.reverse[*idx])
    }

    /// True when the reference independently maps `entrez_id` to `ensembl_id`.
    pub fn reverse_agrees(&self, ensembl_id: &str, entrez_id: &str) -> bool {
        let entrez = SymbolKey::new(entrez_id);
        self.reverse_for_ensembl(ensembl_id)
            .any(|mapping| SymbolKey::new(&mapping.entrez_id) == entrez)
    }

    pub fn delete_symbols(&mut self, rows: impl IntoIterator<Item = RowId>) -> usize {
        let mut removed = 0;
        for row_id in rows {
            if let Some(row) = self.symbols.remove(&row_id) {
                self.unindex_row(row_id, row.entity, &row.symbol);
                removed += 1;
            }
        }
        removed
    }

    pub fn delete_symbols_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&SymbolRow) -> bool,
    {
        let doomed = self
            .symbols
            .values()
            .filter(|row| predicate(row))
            .map(|row| row.row_id)
            .collect::<Vec<_>>();
        self.delete_symbols(doomed)
    }

    pub fn rename_source(&mut self, from: &str, to: &str) -> usize {
        let mut renamed = 0;
        for row in self.symbols.values_mut() {
            if row.source == from {
                row.source = to.to_string();
                renamed += 1;
            }
        }
        renamed
    }

    /// Moves ownership of a symbol row to another entity.
    pub fn reassign(&mut self, row_id: RowId, to: EntityId) -> bool {
        let Some(row) = self.symbols.get_mut(&row_id) else {
            return false;
        };
        let from = row.entity;
        if from == to {
            return false;
        }
        row.entity = to;
        if let Some(rows) = self.by_entity.get_mut(&from) {
            rows.remove(&row_id);
            if rows.is_empty() {
                self.by_entity.remove(&from);
            }
        }
        self.by_entity.entry(to).or_default().insert(row_id);
        true
    }

    pub fn delete_entities(&mut self, ids: impl IntoIterator<Item = EntityId>) -> usize {
        ids.into_iter()
            .filter(|id| self.entities.remove(id).is_some())
            .count()
    }

    pub fn retain_reverse<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&ReverseMapping) -> bool,
    {
        let before = self.reverse.len();
        self.reverse.retain(|mapping| keep(mapping));
        let removed = before - self.reverse.len();
        if removed > 0 {
            self.reindex_reverse();
        }
        removed
    }

    pub fn entities_without_symbols(&self) -> Vec<EntityId> {
        self.entities
            .keys()
            .filter(|id| !self.by_entity.contains_key(id))
            .copied()
            .collect()
    }

    pub fn gene_name_count(&self, id: EntityId) -> usize {
        self.rows_for_entity(id)
            .filter(|row| row.is_source(sources::GENE_NAME))
            .count()
    }

    /// Live symbols ordered by `(entity, source, symbol)`, symbols compared
    /// case-insensitively.
    pub fn sorted_triplets(&self) -> Vec<Triplet> {
        let mut rows = self.symbols.values().collect::<Vec<_>>();
        rows.sort_by(|a, b| export_order(a, b));
        rows.into_iter()
            .map(|row| Triplet {
                entity: row.entity,
                symbol: row.symbol.clone(),
                source: row.source.clone(),
            })
            .collect()
    }

    fn index_row(&mut self, row_id: RowId, entity: EntityId, symbol: &str) {
        self.by_symbol
            .entry(SymbolKey::new(symbol))
            .or_default()
            .insert(row_id);
        self.by_entity.entry(entity).or_default().insert(row_id);
    }

    fn unindex_row(&mut self, row_id: RowId, entity: EntityId, symbol: &str) {
        let key = SymbolKey::new(symbol);
        if let Some(rows) = self.by_symbol.get_mut(&key) {
            rows.remove(&row_id);
            if rows.is_empty() {
                self.by_symbol.remove(&key);
            }
        }
        if let Some(rows) = self.by_entity.get_mut(&entity) {
            rows.remove(&row_id);
            if rows.is_empty() {
                self.by_entity.remove(&entity);
            }
        }
    }

    fn reindex_reverse(&mut self) {
        self.reverse_by_entrez.clear();
        self.reverse_by_ensembl.clear();
        self.index_reverse(0);
    }

    /// Indexes reference rows from `start` to the end of the table.
    fn index_reverse(&mut self, start: usize) {
        for (idx, mapping) in self.reverse.iter().enumerate().skip(start) {
            self.reverse_by_entrez
                .entry(SymbolKey::new(&mapping.entrez_id))
                .or_default()
                .push(idx);
            self.reverse_by_ensembl
                .entry(SymbolKey::new(&mapping.ensembl_id))
                .or_default()
                .push(idx);
        }
    }
}

fn export_order(a: &SymbolRow, b: &SymbolRow) -> std::cmp::Ordering {
    a.entity
        .cmp(&b.entity)
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.key().cmp(&b.key()))
        .then_with(|| a.symbol.cmp(&b.symbol))
        .then_with(|| a.row_id.cmp(&b.row_id))
}
