use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::EntryId;
use crate::error::ScoutError;

const FILES_BASE_URL: &str = "https://files.rcsb.org/download";

/// Raw structure text for one entry, used both for archive assembly and for
/// handing a model to the viewer.
pub trait FileClient: Send + Sync {
    fn fetch_structure(&self, id: &EntryId) -> Result<String, ScoutError>;
}

#[derive(Clone)]
pub struct RcsbFilesHttpClient {
    client: Client,
    base_url: String,
}

impl RcsbFilesHttpClient {
    pub fn new() -> Result<Self, ScoutError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pdb-scout/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ScoutError::FileHttp(err.to_string()))?,
        );
        // Structure downloads carry no request deadline; only the metadata
        // client is bounded.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(None)
            .build()
            .map_err(|err| ScoutError::FileHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: FILES_BASE_URL.to_string(),
        })
    }

    pub fn structure_url(&self, id: &EntryId) -> String {
        format!("{}/{}.pdb", self.base_url, id.as_str())
    }
}

impl FileClient for RcsbFilesHttpClient {
    fn fetch_structure(&self, id: &EntryId) -> Result<String, ScoutError> {
        let url = self.structure_url(id);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| ScoutError::FileHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "structure file request failed".to_string());
            return Err(ScoutError::FileStatus { status, message });
        }
        response
            .text()
            .map_err(|err| ScoutError::FileHttp(err.to_string()))
    }
}
