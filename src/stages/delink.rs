//! Resolves entrez ids claimed by more than one entity, using the trusted
//! entrez to ensembl reference.
//!
//! Forward links are `(entrez, ensembl, gene name)` combinations found inside
//! one entity. A link is consistent when the reference maps the same entrez id
//! to the same ensembl id. Two entities sharing an entrez id conflict; the
//! conflict is only acted on when that entrez id has at least one consistent
//! link, and then only the entrez rows that are not themselves consistent are
//! removed. Conflicts without reference evidence are left for dedup.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::domain::{EntityId, RowId, SymbolKey, sources};
use crate::error::IdMergeError;
use crate::report::ReportSink;
use crate::store::IdentifierStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardLink {
    pub entity: EntityId,
    pub name: String,
    pub entrez_id: String,
    pub ensembl_id: String,
    pub entrez_row: RowId,
    pub ensembl_row: RowId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub entrez_id: SymbolKey,
    pub entity1: EntityId,
    pub entity2: EntityId,
    pub entrez_row1: RowId,
    pub entrez_row2: RowId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DelinkOutcome {
    pub forward_links: usize,
    pub consistent_links: usize,
    pub conflicts: usize,
    pub resolvable_conflicts: usize,
    pub removed: usize,
    /// `entity<TAB>entrez id` of every removed link.
    pub removed_links: Vec<String>,
}

/// Every entrez/ensembl/gene-name combination owned by a single entity.
pub fn forward_links(store: &IdentifierStore) -> Vec<ForwardLink> {
    let mut entities = store.symbols().map(|row| row.entity).collect::<Vec<_>>();
    entities.sort();
    entities.dedup();

    let mut links = Vec::new();
    for entity in entities {
        let rows = store.rows_for_entity(entity).collect::<Vec<_>>();
        let of = |source: &str| {
            rows.iter()
                .filter(|row| row.is_source(source))
                .copied()
                .collect::<Vec<_>>()
        };
        let entrez = of(sources::ENTREZ_GENE_ID);
        let ensembl = of(sources::ENSEMBL_GENE_ID);
        let names = of(sources::GENE_NAME);

        for entrez_row in &entrez {
            for ensembl_row in &ensembl {
                for name in &names {
                    links.push(ForwardLink {
                        entity,
                        name: name.symbol.clone(),
                        entrez_id: entrez_row.symbol.clone(),
                        ensembl_id: ensembl_row.symbol.clone(),
                        entrez_row: entrez_row.row_id,
                        ensembl_row: ensembl_row.row_id,
                    });
                }
            }
        }
    }
    links
}

/// Pairs of distinct entities (lower id first) sharing an entrez id.
pub fn conflicts(links: &[ForwardLink]) -> Vec<Conflict> {
    let mut by_entrez = BTreeMap::<SymbolKey, Vec<&ForwardLink>>::new();
    for link in links {
        by_entrez
            .entry(SymbolKey::new(&link.entrez_id))
            .or_default()
            .push(link);
    }

    let mut found = Vec::new();
    for (entrez_id, group) in by_entrez {
        for first in &group {
            for second in &group {
                if first.entity < second.entity {
                    found.push(Conflict {
                        entrez_id: entrez_id.clone(),
                        entity1: first.entity,
                        entity2: second.entity,
                        entrez_row1: first.entrez_row,
                        entrez_row2: second.entrez_row,
                    });
                }
            }
        }
    }
    found
}

pub fn delink(
    store: &mut IdentifierStore,
    report: &mut dyn ReportSink,
) -> Result<DelinkOutcome, IdMergeError> {
    let links = forward_links(store);

    let consistent = links
        .iter()
        .filter(|link| store.reverse_agrees(&link.ensembl_id, &link.entrez_id))
        .collect::<Vec<_>>();
    let consistent_rows = consistent
        .iter()
        .map(|link| link.entrez_row)
        .collect::<HashSet<_>>();
    let consistent_ids = consistent
        .iter()
        .map(|link| SymbolKey::new(&link.entrez_id))
        .collect::<HashSet<_>>();

    let all_conflicts = conflicts(&links);
    let resolvable = all_conflicts
        .iter()
        .filter(|conflict| consistent_ids.contains(&conflict.entrez_id))
        .collect::<Vec<_>>();

    let doomed = resolvable
        .iter()
        .flat_map(|conflict| [conflict.entrez_row1, conflict.entrez_row2])
        .filter(|row| !consistent_rows.contains(row))
        .filter(|row| {
            store
                .symbol(*row)
                .is_some_and(|symbol| symbol.is_source(sources::ENTREZ_GENE_ID))
        })
        .collect::<BTreeSet<_>>();

    let mut removed_links = doomed
        .iter()
        .filter_map(|row| store.symbol(*row))
        .map(|row| format!("{}\t{}", row.entity, row.symbol))
        .collect::<Vec<_>>();
    removed_links.sort();

    debug!(
        forward = links.len(),
        consistent = consistent.len(),
        conflicts = all_conflicts.len(),
        resolvable = resolvable.len(),
        "delink analysis"
    );

    let outcome = DelinkOutcome {
        forward_links: links.len(),
        consistent_links: consistent.len(),
        conflicts: all_conflicts.len(),
        resolvable_conflicts: resolvable.len(),
        removed: 0,
        removed_links,
    };
    let removed = store.delete_symbols(doomed);

    report.line(&format!(
        "removing {removed} entrez links contradicted by reverse mappings:"
    ))?;
    report.lines(&outcome.removed_links)?;

    Ok(DelinkOutcome { removed, ..outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewSymbol, ReverseMapping};
    use crate::report::NullReport;

    fn entity(store: &mut IdentifierStore, id: u64, ensembl: &str, entrez: &[&str]) {
        let id = EntityId::new(id);
        store.add_entity(id, "protein_coding", "").unwrap();
        store.add_symbols([
            NewSymbol::new(id, ensembl, sources::ENSEMBL_GENE_ID),
            NewSymbol::new(id, format!("gene{}", id), sources::GENE_NAME),
        ]);
        store.add_symbols(
            entrez
                .iter()
                .map(|value| NewSymbol::new(id, *value, sources::ENTREZ_GENE_ID)),
        );
    }

    fn reverse(entrez: &str, ensembl: &str) -> ReverseMapping {
        ReverseMapping {
            entrez_id: entrez.to_string(),
            name: format!("gene_{entrez}"),
            ensembl_id: ensembl.to_string(),
            biotype: "protein-coding".to_string(),
        }
    }

    #[test]
    fn forward_links_cover_every_combination() {
        let mut store = IdentifierStore::new();
        entity(&mut store, 3, "ENSG03", &["3", "4"]);
        let links = forward_links(&store);
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|link| link.name == "gene3"));
    }

    #[test]
    fn corroborated_conflict_drops_uncorroborated_link() {
        let mut store = IdentifierStore::new();
        entity(&mut store, 4, "ENSG04", &["5"]);
        entity(&mut store, 5, "ENSG05", &["5"]);
        store.add_reverse_mappings([reverse("5", "ENSG04")]);

        let outcome = delink(&mut store, &mut NullReport).unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.resolvable_conflicts, 1);
        let remaining = store.rows_for_symbol("5");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].entity, EntityId::new(4));
    }

    #[test]
    fn conflict_without_reference_is_preserved() {
        let mut store = IdentifierStore::new();
        entity(&mut store, 11, "ENSG11", &["10"]);
        entity(&mut store, 12, "ENSG12", &["10"]);

        let outcome = delink(&mut store, &mut NullReport).unwrap();
        assert_eq!(outcome.conflicts, 1);
        assert_eq!(outcome.resolvable_conflicts, 0);
        assert_eq!(outcome.removed, 0);
        assert_eq!(store.rows_for_symbol("10").len(), 2);
    }

    #[test]
    fn doubly_corroborated_conflict_is_preserved() {
        let mut store = IdentifierStore::new();
        entity(&mut store, 7, "ENSG07", &["8"]);
        entity(&mut store, 8, "ENSG08", &["8"]);
        store.add_reverse_mappings([reverse("8", "ENSG07"), reverse("8", "ENSG08")]);

        let outcome = delink(&mut store, &mut NullReport).unwrap();
        assert_eq!(outcome.consistent_links, 2);
        assert_eq!(outcome.removed, 0);
    }
}
