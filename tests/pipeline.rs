use std::io::Cursor;

use kira_idmerge::domain::EntityId;
use kira_idmerge::loader;
use kira_idmerge::pipeline::{Pipeline, PipelineOptions, RunMode, Stage};
use kira_idmerge::report::{MemoryReport, NullReport};
use kira_idmerge::stages::{self, CleanOptions};
use kira_idmerge::store::IdentifierStore;

fn tsv(rows: &[&[&str]]) -> String {
    rows.iter()
        .map(|row| format!("{}\n", row.join("\t")))
        .collect()
}

fn scenario_input() -> String {
    tsv(&[
        &["GMID", "Gene Name", "Protein Coding", "Synonyms", "Definition"],
        &["1", "happy", "True", "silly;putty", "a happy gene"],
        &["2", "sad", "protein_coding", "serious;putty;sad", "N/A"],
        &["3", "happy", "True", "naughty", ""],
        &["4", "strange", "False", "whatever", ""],
        &["5", "N/A", "True", "whatsmyname", ""],
        &["6", "sad", "rna", "ignore;me", ""],
    ])
}

#[test]
fn process_scenario_end_to_end() {
    let mut report = MemoryReport::default();
    let mut pipeline = Pipeline::new(PipelineOptions::for_mode(RunMode::Process), &mut report);
    pipeline
        .load_wide(Cursor::new(scenario_input()), "scenario")
        .unwrap();
    let summary = pipeline.process().unwrap();
    pipeline.validate().unwrap();

    let counts = summary
        .stages
        .iter()
        .map(|stage| (stage.stage, stage.symbols, stage.entities))
        .collect::<Vec<_>>();
    assert_eq!(
        counts,
        vec![
            (Stage::Load, 16, 6),
            (Stage::Clean, 15, 6),
            (Stage::BiotypeFilter, 10, 4),
            (Stage::Delink, 10, 4),
            (Stage::Merge, 10, 3),
            (Stage::Dedup, 6, 3),
            (Stage::CleanEmpties, 6, 3),
        ]
    );

    let mut out = Vec::new();
    let written = pipeline.export(&mut out).unwrap();
    assert_eq!(written, 6);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "1\thappy\tGene Name\n\
         1\tnaughty\tSynonym\n\
         1\tsilly\tSynonym\n\
         2\tsad\tGene Name\n\
         2\tserious\tSynonym\n\
         5\twhatsmyname\tSynonym\n"
    );

    assert_eq!(summary.dedup.synonyms_removed, 1);
    assert_eq!(summary.dedup.cross_entity_symbols, 1);
    assert_eq!(summary.dedup.within_entity_removed, 1);
    drop(pipeline);
    assert!(report.contains("1 gene names belong to multiple genes and will be merged"));
    assert!(report.contains("total records removed: 2, symbols removed: 5"));
}

#[test]
fn melt_scenario_keeps_collisions() {
    let mut report = NullReport;
    let mut pipeline = Pipeline::new(PipelineOptions::for_mode(RunMode::Melt), &mut report);
    pipeline
        .load_wide(Cursor::new(scenario_input()), "scenario")
        .unwrap();
    let summary = pipeline.melt().unwrap();
    assert!(summary.biotype.is_none());
    assert_eq!(pipeline.store().symbols_size(), 15);

    let mut descriptions = Vec::new();
    pipeline.export_descriptions(&mut descriptions).unwrap();
    assert_eq!(
        String::from_utf8(descriptions).unwrap(),
        "1\ta happy gene\n2\t\n3\t\n4\t\n5\t\n6\t\n"
    );
}

#[test]
fn scrub_of_processed_output_is_stable() {
    let (mut first_report, mut second_report) = (NullReport, NullReport);
    let mut first = Pipeline::new(PipelineOptions::for_mode(RunMode::Process), &mut first_report);
    first
        .load_wide(Cursor::new(scenario_input()), "scenario")
        .unwrap();
    first.process().unwrap();
    let mut processed = Vec::new();
    first.export(&mut processed).unwrap();

    let mut second = Pipeline::new(PipelineOptions::for_mode(RunMode::Scrub), &mut second_report);
    second
        .load_triplets(Cursor::new(processed.clone()), "processed")
        .unwrap();
    let summary = second.process().unwrap();
    second.validate().unwrap();
    assert!(summary.merge.is_none());

    let mut scrubbed = Vec::new();
    second.export(&mut scrubbed).unwrap();
    assert_eq!(scrubbed, processed);
}

fn delink_input() -> String {
    let mut rows: Vec<Vec<String>> = vec![
        [
            "GMID",
            "Ensembl Gene ID",
            "Gene Name",
            "Protein Coding",
            "Entrez Gene ID",
            "Synonyms",
            "Definition",
        ]
        .iter()
        .map(|field| field.to_string())
        .collect(),
    ];
    let entities: [(&str, &str); 11] = [
        ("1", "1"),
        ("2", "2"),
        ("3", "3;4"),
        ("4", "5"),
        ("5", "5"),
        ("6", "6;7"),
        ("7", "8"),
        ("8", "8"),
        ("9", "9"),
        ("11", "10"),
        ("12", "10"),
    ];
    for (gmid, entrez) in entities {
        rows.push(vec![
            gmid.to_string(),
            format!("ENSG{gmid:0>2}"),
            format!("gene{gmid}"),
            "protein_coding".to_string(),
            entrez.to_string(),
            String::new(),
            String::new(),
        ]);
    }
    rows.iter().map(|row| format!("{}\n", row.join("\t"))).collect()
}

fn delink_reverse() -> String {
    tsv(&[
        &["GeneID", "Symbol", "Synonyms", "dbXrefs", "description", "type_of_gene"],
        &["1", "gene_1", "", "HGNC:1|Ensembl:ENSG01", "", "protein-coding"],
        &["2", "gene_2", "", "HGNC:2", "", "protein-coding"],
        &["3", "gene_3", "", "Ensembl:ENSG03", "", "protein-coding"],
        &["4", "gene_4", "", "", "", "protein-coding"],
        &["5", "gene_5", "", "Ensembl:ENSG04", "", "protein-coding"],
        &["6", "gene_6", "", "Ensembl:ENSG06", "", "protein-coding"],
        &["7", "gene_7", "", "Ensembl:ENSG06", "", "protein-coding"],
        &["8", "gene_8", "", "Ensembl:ENSG07|Ensembl:ENSG08", "", "protein-coding"],
        &["9", "gene_9", "", "Ensembl:ENSG10", "", "protein-coding"],
    ])
}

#[test]
fn delink_scenario_removes_only_contradicted_link() {
    let mut store = IdentifierStore::new();
    loader::load_wide(&mut store, Cursor::new(delink_input()), "delink").unwrap();
    loader::load_reverse(&mut store, Cursor::new(delink_reverse()), "reverse").unwrap();
    stages::clean(&mut store, &CleanOptions::default(), &mut NullReport).unwrap();
    assert_eq!(store.symbols_size(), 35);
    assert_eq!(store.entities_size(), 11);

    let mut report = MemoryReport::default();
    let outcome = stages::delink(&mut store, &mut report).unwrap();
    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.removed_links, vec!["5\t5".to_string()]);
    assert_eq!(store.symbols_size(), 34);
    assert_eq!(store.entities_size(), 11);
    assert!(store
        .rows_for_entity(EntityId::new(5))
        .all(|row| row.source != "Entrez Gene ID"));

    let expected = tsv(&[
        &["1", "ENSG01", "Ensembl Gene ID"],
        &["1", "1", "Entrez Gene ID"],
        &["1", "gene1", "Gene Name"],
        &["2", "ENSG02", "Ensembl Gene ID"],
        &["2", "2", "Entrez Gene ID"],
        &["2", "gene2", "Gene Name"],
        &["3", "ENSG03", "Ensembl Gene ID"],
        &["3", "3", "Entrez Gene ID"],
        &["3", "4", "Entrez Gene ID"],
        &["3", "gene3", "Gene Name"],
        &["4", "ENSG04", "Ensembl Gene ID"],
        &["4", "5", "Entrez Gene ID"],
        &["4", "gene4", "Gene Name"],
        &["5", "ENSG05", "Ensembl Gene ID"],
        &["5", "gene5", "Gene Name"],
        &["6", "ENSG06", "Ensembl Gene ID"],
        &["6", "6", "Entrez Gene ID"],
        &["6", "7", "Entrez Gene ID"],
        &["6", "gene6", "Gene Name"],
        &["7", "ENSG07", "Ensembl Gene ID"],
        &["7", "8", "Entrez Gene ID"],
        &["7", "gene7", "Gene Name"],
        &["8", "ENSG08", "Ensembl Gene ID"],
        &["8", "8", "Entrez Gene ID"],
        &["8", "gene8", "Gene Name"],
        &["9", "ENSG09", "Ensembl Gene ID"],
        &["9", "9", "Entrez Gene ID"],
        &["9", "gene9", "Gene Name"],
        &["11", "ENSG11", "Ensembl Gene ID"],
        &["11", "10", "Entrez Gene ID"],
        &["11", "gene11", "Gene Name"],
        &["12", "ENSG12", "Ensembl Gene ID"],
        &["12", "10", "Entrez Gene ID"],
        &["12", "gene12", "Gene Name"],
    ]);
    let mut out = Vec::new();
    kira_idmerge::export::export_processed(&store, &mut out, None).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn reverse_rows_outside_reference_biotypes_are_dropped() {
    let reverse = tsv(&[
        &["GeneID", "Symbol", "dbXrefs", "type_of_gene"],
        &["1", "gene_1", "Ensembl:ENSG01", "protein-coding"],
        &["2", "gene_2", "Ensembl:ENSG02", "ncRNA"],
    ]);
    let wide = tsv(&[
        &["GMID", "Gene Name", "Protein Coding", "Definition"],
        &["1", "gene1", "True", ""],
    ]);

    let mut report = NullReport;
    let mut pipeline = Pipeline::new(PipelineOptions::default(), &mut report);
    pipeline.load_wide(Cursor::new(wide), "wide").unwrap();
    pipeline.load_reverse(Cursor::new(reverse), "reverse").unwrap();
    let outcome = pipeline.biotype_filter().unwrap().unwrap();
    assert_eq!(outcome.reverse_removed, 1);
    assert_eq!(pipeline.store().reverse_size(), 1);
}

#[test]
fn reference_filter_runs_without_entity_allow_list() {
    let wide = tsv(&[
        &["GMID", "Ensembl Gene ID", "Gene Name", "Protein Coding", "Entrez Gene ID", "Definition"],
        &["4", "ENSG04", "gene4", "protein_coding", "5", ""],
        &["5", "ENSG05", "gene5", "protein_coding", "5", ""],
    ]);
    let reverse = tsv(&[
        &["GeneID", "Symbol", "dbXrefs", "type_of_gene"],
        &["5", "gene_5", "Ensembl:ENSG04", "ncRNA"],
    ]);
    let options = PipelineOptions {
        biotypes: None,
        ..PipelineOptions::for_mode(RunMode::Process)
    };

    let mut report = MemoryReport::default();
    let mut pipeline = Pipeline::new(options, &mut report);
    pipeline.load_wide(Cursor::new(wide), "wide").unwrap();
    pipeline.load_reverse(Cursor::new(reverse), "reverse").unwrap();
    let summary = pipeline.process().unwrap();

    assert!(summary.biotype.is_none());
    assert_eq!(pipeline.store().reverse_size(), 0);
    assert_eq!(summary.delink.removed, 0);
    drop(pipeline);
    assert!(report.contains("reference rows removed: 1"));
}
