use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Value, json};

use crate::domain::{EntryId, Query};
use crate::error::ScoutError;

const SEARCH_URL: &str = "https://search.rcsb.org/rcsbsearch/v2/query";

/// Two-stage search against the structure database.
///
/// `search` is the policy the pipeline relies on: the precise query wins when
/// it returns anything; a failed or empty precise stage falls back to full
/// text; a failed fallback is absorbed as an empty result. The two stages are
/// never mixed.
pub trait SearchClient: Send + Sync {
    fn precise(&self, query: &Query) -> Result<Vec<EntryId>, ScoutError>;
    fn full_text(&self, query: &Query) -> Result<Vec<EntryId>, ScoutError>;

    fn search(&self, query: &Query) -> Vec<EntryId> {
        match self.precise(query) {
            Ok(ids) if !ids.is_empty() => return ids,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "precise search failed, falling back");
            }
        }
        match self.full_text(query) {
            Ok(ids) => ids,
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "full-text search failed");
                Vec::new()
            }
        }
    }
}

#[derive(Clone)]
pub struct RcsbSearchHttpClient {
    client: Client,
    search_url: String,
}

impl RcsbSearchHttpClient {
    pub fn new() -> Result<Self, ScoutError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pdb-scout/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ScoutError::SearchHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| ScoutError::SearchHttp(err.to_string()))?;
        Ok(Self {
            client,
            search_url: SEARCH_URL.to_string(),
        })
    }

    fn post_query(&self, payload: &Value) -> Result<Vec<EntryId>, ScoutError> {
        let response = self
            .client
            .post(&self.search_url)
            .json(payload)
            .send()
            .map_err(|err| ScoutError::SearchHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "search request failed".to_string());
            return Err(ScoutError::SearchStatus { status, message });
        }
        let body: Value = response
            .json()
            .map_err(|err| ScoutError::SearchHttp(err.to_string()))?;
        Ok(parse_result_set(&body))
    }
}

impl SearchClient for RcsbSearchHttpClient {
    fn precise(&self, query: &Query) -> Result<Vec<EntryId>, ScoutError> {
        self.post_query(&precise_payload(query))
    }

    fn full_text(&self, query: &Query) -> Result<Vec<EntryId>, ScoutError> {
        self.post_query(&full_text_payload(query))
    }
}

/// OR-group over title phrase, description words, and uppercased gene name.
pub fn precise_payload(query: &Query) -> Value {
    json!({
        "query": {
            "type": "group",
            "logical_operator": "or",
            "nodes": [
                {
                    "type": "terminal",
                    "service": "text",
                    "parameters": {
                        "attribute": "struct.title",
                        "operator": "contains_phrase",
                        "value": query.as_str()
                    }
                },
                {
                    "type": "terminal",
                    "service": "text",
                    "parameters": {
                        "attribute": "rcsb_polymer_entity.pdbx_description",
                        "operator": "contains_words",
                        "value": query.as_str()
                    }
                },
                {
                    "type": "terminal",
                    "service": "text",
                    "parameters": {
                        "attribute": "rcsb_entity_source_organism.gene.rcsb_gene_name.value",
                        "operator": "contains_words",
                        "value": query.as_str().to_uppercase()
                    }
                }
            ]
        },
        "return_type": "entry",
        "request_options": { "return_all_hits": true }
    })
}

pub fn full_text_payload(query: &Query) -> Value {
    json!({
        "query": {
            "type": "terminal",
            "service": "full_text",
            "parameters": { "value": query.as_str() }
        },
        "return_type": "entry",
        "request_options": { "return_all_hits": true }
    })
}

/// Pull entry identifiers out of a search response body. Entries whose
/// identifier does not parse are skipped.
pub fn parse_result_set(body: &Value) -> Vec<EntryId> {
    body.get("result_set")
        .and_then(|value| value.as_array())
        .map(|records| {
            records
                .iter()
                .filter_map(|record| record.get("identifier"))
                .filter_map(|value| value.as_str())
                .filter_map(|raw| EntryId::from_str(raw).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct StagedSearch {
        precise: Result<Vec<&'static str>, ()>,
        full_text: Result<Vec<&'static str>, ()>,
        full_text_calls: Mutex<usize>,
    }

    impl StagedSearch {
        fn ids(raw: &Result<Vec<&'static str>, ()>, which: &str) -> Result<Vec<EntryId>, ScoutError> {
            match raw {
                Ok(ids) => Ok(ids.iter().map(|id| id.parse().unwrap()).collect()),
                Err(()) => Err(ScoutError::SearchHttp(format!("{which} stage down"))),
            }
        }
    }

    impl SearchClient for StagedSearch {
        fn precise(&self, _query: &Query) -> Result<Vec<EntryId>, ScoutError> {
            Self::ids(&self.precise, "precise")
        }

        fn full_text(&self, _query: &Query) -> Result<Vec<EntryId>, ScoutError> {
            *self.full_text_calls.lock().unwrap() += 1;
            Self::ids(&self.full_text, "full_text")
        }
    }

    fn query() -> Query {
        "EGFR".parse().unwrap()
    }

    #[test]
    fn precise_results_win_without_fallback() {
        let client = StagedSearch {
            precise: Ok(vec!["1ABC", "2DEF"]),
            full_text: Ok(vec!["9ZZZ"]),
            full_text_calls: Mutex::new(0),
        };
        let ids = client.search(&query());
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].as_str(), "1ABC");
        assert_eq!(*client.full_text_calls.lock().unwrap(), 0);
    }

    #[test]
    fn empty_precise_falls_back_to_full_text() {
        let client = StagedSearch {
            precise: Ok(vec![]),
            full_text: Ok(vec!["9ZZZ"]),
            full_text_calls: Mutex::new(0),
        };
        let ids = client.search(&query());
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].as_str(), "9ZZZ");
    }

    #[test]
    fn failed_precise_falls_back_to_full_text() {
        let client = StagedSearch {
            precise: Err(()),
            full_text: Ok(vec!["9ZZZ"]),
            full_text_calls: Mutex::new(0),
        };
        let ids = client.search(&query());
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn total_failure_is_empty_not_fatal() {
        let client = StagedSearch {
            precise: Err(()),
            full_text: Err(()),
            full_text_calls: Mutex::new(0),
        };
        assert!(client.search(&query()).is_empty());
    }

    #[test]
    fn precise_payload_uppercases_gene_field_only() {
        let payload = precise_payload(&"egfr kinase".parse().unwrap());
        let nodes = payload["query"]["nodes"].as_array().unwrap();
        assert_eq!(nodes[0]["parameters"]["value"], "egfr kinase");
        assert_eq!(nodes[1]["parameters"]["value"], "egfr kinase");
        assert_eq!(nodes[2]["parameters"]["value"], "EGFR KINASE");
        assert_eq!(payload["return_type"], "entry");
        assert_eq!(payload["request_options"]["return_all_hits"], true);
    }

    #[test]
    fn parse_result_set_skips_malformed_identifiers() {
        let body = json!({
            "result_set": [
                { "identifier": "6LU7" },
                { "identifier": "bad id" },
                { "score": 1.0 },
                { "identifier": "4HHB" }
            ]
        });
        let ids = parse_result_set(&body);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].as_str(), "6LU7");
        assert_eq!(ids[1].as_str(), "4HHB");
    }

    #[test]
    fn parse_result_set_handles_missing_field() {
        assert!(parse_result_set(&json!({})).is_empty());
    }
}
