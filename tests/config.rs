use std::fs;

use assert_matches::assert_matches;

use kira_idmerge::config::{Config, ConfigLoader};
use kira_idmerge::error::IdMergeError;
use kira_idmerge::pipeline::RunMode;

fn write_config(content: &str) -> (tempfile::TempDir, String) {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-idm.json");
    fs::write(&path, content).unwrap();
    let path = path.to_string_lossy().into_owned();
    (temp, path)
}

#[test]
fn resolve_config_from_file() {
    let (_temp, path) = write_config(
        r#"{
            "schema_version": 1,
            "organism_prefix": "Mm",
            "biotypes": ["protein_coding"],
            "merge_names": false
        }"#,
    );

    let resolved = ConfigLoader::resolve(Some(&path)).unwrap();
    let options = resolved.options(RunMode::Process);
    assert_eq!(options.organism_prefix.unwrap().as_str(), "Mm");
    assert_eq!(options.biotypes, Some(vec!["protein_coding".to_string()]));
    assert!(!options.merge_names);
    assert_eq!(
        options.clean.sources_to_remove,
        vec!["Ensembl Transcript ID".to_string()]
    );
}

#[test]
fn explicit_missing_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(Some(&path.to_string_lossy())).unwrap_err();
    assert_matches!(err, IdMergeError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let (_temp, path) = write_config("{ \"biotypes\": ");
    assert_matches!(
        ConfigLoader::resolve(Some(&path)),
        Err(IdMergeError::ConfigParse(_))
    );
}

#[test]
fn unknown_schema_version_is_rejected() {
    let config = Config {
        schema_version: Some(2),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(IdMergeError::ConfigParse(_))
    );
}

#[test]
fn invalid_prefix_is_rejected() {
    let config = Config {
        organism_prefix: Some("not a prefix".to_string()),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(IdMergeError::InvalidOrganismPrefix(_))
    );
}
