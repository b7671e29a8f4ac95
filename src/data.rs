use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::domain::EntryId;
use crate::error::ScoutError;

const DATA_BASE_URL: &str = "https://data.rcsb.org/rest/v1/core";

/// Raw metadata fetches for one entry and its polymer entities.
pub trait DataClient: Send + Sync {
    fn fetch_entry(&self, id: &EntryId) -> Result<Value, ScoutError>;
    fn fetch_polymer_entity(&self, id: &EntryId, entity_id: &str) -> Result<Value, ScoutError>;
}

/// Entry-level fields plus the polymer entity ids to walk next.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySummary {
    pub title: String,
    pub method: String,
    pub resolution: Option<f64>,
    pub polymer_entity_ids: Vec<String>,
}

/// Per-entity source organism and chain labels.
#[derive(Debug, Clone, PartialEq)]
pub struct PolymerEntity {
    pub organism: Option<String>,
    pub chain_labels: Vec<String>,
}

#[derive(Clone)]
pub struct RcsbDataHttpClient {
    client: Client,
    base_url: String,
}

impl RcsbDataHttpClient {
    pub fn new() -> Result<Self, ScoutError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pdb-scout/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ScoutError::DataHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| ScoutError::DataHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: DATA_BASE_URL.to_string(),
        })
    }

    fn get_json(&self, url: &str) -> Result<Value, ScoutError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ScoutError::DataHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "metadata request failed".to_string());
            return Err(ScoutError::DataStatus { status, message });
        }
        response
            .json()
            .map_err(|err| ScoutError::DataHttp(err.to_string()))
    }
}

impl DataClient for RcsbDataHttpClient {
    fn fetch_entry(&self, id: &EntryId) -> Result<Value, ScoutError> {
        let url = format!("{}/entry/{}", self.base_url, id.as_str());
        self.get_json(&url)
    }

    fn fetch_polymer_entity(&self, id: &EntryId, entity_id: &str) -> Result<Value, ScoutError> {
        let url = format!(
            "{}/polymer_entity/{}/{}",
            self.base_url,
            id.as_str(),
            entity_id
        );
        self.get_json(&url)
    }
}

/// Extract the entry summary. Missing fields take the database's customary
/// placeholders rather than failing the entry.
pub fn parse_entry(raw: &Value) -> EntrySummary {
    let title = raw
        .get("struct")
        .and_then(|value| value.get("title"))
        .and_then(|value| value.as_str())
        .unwrap_or("No Title")
        .to_string();
    let method = raw
        .get("exptl")
        .and_then(|value| value.as_array())
        .and_then(|array| array.first())
        .and_then(|value| value.get("method"))
        .and_then(|value| value.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let resolution = raw
        .get("rcsb_entry_info")
        .and_then(|value| value.get("resolution_combined"))
        .and_then(|value| value.as_array())
        .and_then(|array| array.first())
        .and_then(|value| value.as_f64());
    let polymer_entity_ids = raw
        .get("rcsb_entry_container_identifiers")
        .and_then(|value| value.get("polymer_entity_ids"))
        .and_then(|value| value.as_array())
        .map(|array| {
            array
                .iter()
                .filter_map(|value| value.as_str())
                .map(|value| value.to_string())
                .collect()
        })
        .unwrap_or_default();

    EntrySummary {
        title,
        method,
        resolution,
        polymer_entity_ids,
    }
}

/// Extract one polymer entity. The organism is the first listed source's
/// scientific name; an entity with sources but no name reports "Unknown".
pub fn parse_polymer_entity(raw: &Value) -> PolymerEntity {
    let organism = raw
        .get("rcsb_entity_source_organism")
        .and_then(|value| value.as_array())
        .and_then(|array| array.first())
        .map(|source| {
            source
                .get("scientific_name")
                .and_then(|value| value.as_str())
                .unwrap_or("Unknown")
                .to_string()
        });
    let chain_labels = raw
        .get("rcsb_polymer_entity_container_identifiers")
        .and_then(|value| value.get("auth_asym_ids"))
        .and_then(|value| value.as_array())
        .map(|array| {
            array
                .iter()
                .filter_map(|value| value.as_str())
                .map(|value| value.to_string())
                .collect()
        })
        .unwrap_or_default();

    PolymerEntity {
        organism,
        chain_labels,
    }
}
