use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{
    OrganismPrefix, default_biotypes, default_reference_biotypes, default_sources_to_remove,
    default_synonym_aliases,
};
use crate::error::IdMergeError;
use crate::pipeline::{PipelineOptions, RunMode};
use crate::stages::CleanOptions;

pub const DEFAULT_CONFIG_FILE: &str = "kira-idm.json";

/// On-disk run configuration. Every field is optional; missing fields fall
/// back to the defaults of the selected run mode.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub organism_prefix: Option<String>,
    #[serde(default)]
    pub biotypes: Option<Vec<String>>,
    #[serde(default)]
    pub reference_biotypes: Option<Vec<String>>,
    #[serde(default)]
    pub sources_to_remove: Option<Vec<String>>,
    #[serde(default)]
    pub merge_names: Option<bool>,
    #[serde(default)]
    pub synonym_aliases: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub organism_prefix: Option<OrganismPrefix>,
    pub biotypes: Option<Vec<String>>,
    pub reference_biotypes: Option<Vec<String>>,
    pub sources_to_remove: Option<Vec<String>>,
    pub merge_names: Option<bool>,
    pub synonym_aliases: Option<Vec<String>>,
}

impl ResolvedConfig {
    /// Mode defaults overlaid with whatever the config file set.
    pub fn options(&self, mode: RunMode) -> PipelineOptions {
        let defaults = PipelineOptions::for_mode(mode);
        PipelineOptions {
            biotypes: match &self.biotypes {
                Some(biotypes) => Some(biotypes.clone()),
                None => defaults.biotypes,
            },
            reference_biotypes: self
                .reference_biotypes
                .clone()
                .unwrap_or(defaults.reference_biotypes),
            clean: CleanOptions {
                sources_to_remove: self
                    .sources_to_remove
                    .clone()
                    .unwrap_or(defaults.clean.sources_to_remove),
                synonym_aliases: self
                    .synonym_aliases
                    .clone()
                    .unwrap_or(defaults.clean.synonym_aliases),
            },
            merge_names: self.merge_names.unwrap_or(defaults.merge_names),
            organism_prefix: self.organism_prefix.clone(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads the config at `path`, or `kira-idm.json` in the working directory
    /// when no path is given. A missing default file is not an error.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, IdMergeError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| IdMergeError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| IdMergeError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, IdMergeError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(IdMergeError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let organism_prefix = config
            .organism_prefix
            .map(|prefix| prefix.parse::<OrganismPrefix>())
            .transpose()?;

        Ok(ResolvedConfig {
            schema_version,
            organism_prefix,
            biotypes: config.biotypes,
            reference_biotypes: config.reference_biotypes,
            sources_to_remove: config.sources_to_remove,
            merge_names: config.merge_names,
            synonym_aliases: config.synonym_aliases,
        })
    }
}

/// Settings a user would typically start a config file from.
pub fn starter_config() -> Config {
    Config {
        schema_version: Some(1),
        organism_prefix: None,
        biotypes: Some(default_biotypes()),
        reference_biotypes: Some(default_reference_biotypes()),
        sources_to_remove: Some(default_sources_to_remove()),
        merge_names: Some(true),
        synonym_aliases: Some(default_synonym_aliases()),
    }
}
