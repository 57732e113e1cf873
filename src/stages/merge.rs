use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{EntityId, RowId, SymbolKey, sources};
use crate::error::IdMergeError;
use crate::report::ReportSink;
use crate::store::IdentifierStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Gene names shared by more than one entity.
    pub merged_names: Vec<String>,
    pub symbols_reassigned: usize,
    pub entities_removed: usize,
}

/// Disjoint sets over entity ids; the representative is always the lowest id.
#[derive(Debug, Default)]
struct Components {
    parent: BTreeMap<EntityId, EntityId>,
}

impl Components {
    fn find(&mut self, id: EntityId) -> EntityId {
        let mut root = *self.parent.entry(id).or_insert(id);
        let mut current = id;
        while root != current {
            current = root;
            root = self.parent[&current];
        }

        // path compression
        let mut current = id;
        while current != root {
            let next = self.parent[&current];
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: EntityId, b: EntityId) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent.insert(high, low);
        }
    }
}

/// Folds entities sharing a gene name into the lowest-id entity of the group.
///
/// Entities linked through a chain of shared gene names end up in one group.
/// Merging introduces same-entity duplicate symbols, which the within-entity
/// dedup tier removes.
pub fn merge_by_name(
    store: &mut IdentifierStore,
    report: &mut dyn ReportSink,
) -> Result<MergeOutcome, IdMergeError> {
    let mut by_name = BTreeMap::<SymbolKey, (String, BTreeSet<EntityId>)>::new();
    for row in store.symbols().filter(|row| row.is_source(sources::GENE_NAME)) {
        by_name
            .entry(row.key())
            .or_insert_with(|| (row.symbol.clone(), BTreeSet::new()))
            .1
            .insert(row.entity);
    }

    let mut components = Components::default();
    let mut merged_names = Vec::new();
    for (name, entities) in by_name.into_values() {
        if entities.len() < 2 {
            continue;
        }
        merged_names.push(name);
        let mut members = entities.into_iter();
        if let Some(first) = members.next() {
            for other in members {
                components.union(first, other);
            }
        }
    }

    let members = components.parent.keys().copied().collect::<Vec<_>>();
    let mut survivors = BTreeMap::<EntityId, EntityId>::new();
    for id in members {
        let root = components.find(id);
        if root != id {
            survivors.insert(id, root);
        }
    }

    let to_fix = survivors
        .iter()
        .flat_map(|(from, to)| {
            store
                .rows_for_entity(*from)
                .map(|row| (row.row_id, *to))
                .collect::<Vec<(RowId, EntityId)>>()
        })
        .collect::<Vec<_>>();

    report.line(&format!(
        "{} gene names belong to multiple genes and will be merged",
        merged_names.len()
    ))?;
    report.lines(&merged_names)?;

    let symbols_reassigned = to_fix
        .into_iter()
        .filter(|(row, to)| store.reassign(*row, *to))
        .count();
    let entities_removed = store.delete_entities(survivors.into_keys());

    Ok(MergeOutcome {
        merged_names,
        symbols_reassigned,
        entities_removed,
    })
}
