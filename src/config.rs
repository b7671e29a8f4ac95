use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Concurrency, MethodFilter, ResolutionCeiling};
use crate::error::ScoutError;

/// On-disk shape of `pdb-scout.json`. Every field is optional; absent values
/// fall back to the same defaults the interactive controls start with.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub only_human: Option<bool>,
    #[serde(default)]
    pub monomer_only: Option<bool>,
    #[serde(default)]
    pub max_resolution: Option<f64>,
    #[serde(default)]
    pub method: Option<MethodFilter>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub only_human: bool,
    pub monomer_only: bool,
    pub max_resolution: ResolutionCeiling,
    pub method: MethodFilter,
    pub concurrency: Concurrency,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            only_human: false,
            monomer_only: false,
            max_resolution: ResolutionCeiling::default(),
            method: MethodFilter::Any,
            concurrency: Concurrency::default(),
            cache_capacity: 64,
            cache_ttl_secs: 900,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from `path`, or from `pdb-scout.json` in the working
    /// directory when no path is given. An implicit file that does not exist
    /// resolves to defaults; an explicit path must exist and parse.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ScoutError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("pdb-scout.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ScoutError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ScoutError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ScoutError> {
        let defaults = ResolvedConfig::default();
        let cache = config.cache.unwrap_or(CacheConfig {
            capacity: None,
            ttl_secs: None,
        });

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            only_human: config.only_human.unwrap_or(defaults.only_human),
            monomer_only: config.monomer_only.unwrap_or(defaults.monomer_only),
            max_resolution: config
                .max_resolution
                .map(ResolutionCeiling::new)
                .transpose()?
                .unwrap_or(defaults.max_resolution),
            method: config.method.unwrap_or(defaults.method),
            concurrency: config
                .concurrency
                .map(Concurrency::new)
                .transpose()?
                .unwrap_or(defaults.concurrency),
            cache_capacity: cache.capacity.unwrap_or(defaults.cache_capacity),
            cache_ttl_secs: cache.ttl_secs.unwrap_or(defaults.cache_ttl_secs),
        })
    }
}
