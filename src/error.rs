use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ScoutError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("invalid entry id: {0}")]
    InvalidEntryId(String),

    #[error("concurrency must be between 1 and 20, got {0}")]
    InvalidConcurrency(usize),

    #[error("resolution ceiling must be between 1.0 and 5.0, got {0}")]
    InvalidResolutionCeiling(f64),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no entries found for query: {0}")]
    NoEntriesFound(String),

    #[error("search request failed: {0}")]
    SearchHttp(String),

    #[error("search returned status {status}: {message}")]
    SearchStatus { status: u16, message: String },

    #[error("metadata request failed: {0}")]
    DataHttp(String),

    #[error("metadata returned status {status}: {message}")]
    DataStatus { status: u16, message: String },

    #[error("structure file request failed: {0}")]
    FileHttp(String),

    #[error("structure file returned status {status}: {message}")]
    FileStatus { status: u16, message: String },

    #[error("archive write failed: {0}")]
    Archive(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
