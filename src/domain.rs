use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ScoutError;

/// Free-text protein or gene name as the user typed it. The gene-name search
/// field uses an uppercased variant; no other normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cache key: surrounding whitespace carries no search meaning.
    pub fn normalized(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Query {
    type Err = ScoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err(ScoutError::EmptyQuery);
        }
        Ok(Self(value.to_string()))
    }
}

/// Opaque identifier of one structure entry, spliced into request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = ScoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !is_valid {
            return Err(ScoutError::InvalidEntryId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Worker pool width for metadata enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Concurrency(usize);

impl Concurrency {
    pub const MIN: usize = 1;
    pub const MAX: usize = 20;

    pub fn new(value: usize) -> Result<Self, ScoutError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ScoutError::InvalidConcurrency(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<usize> for Concurrency {
    type Error = ScoutError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Concurrency> for usize {
    fn from(value: Concurrency) -> Self {
        value.0
    }
}

impl FromStr for Concurrency {
    type Err = ScoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .parse::<usize>()
            .map_err(|_| ScoutError::InvalidConcurrency(0))?;
        Self::new(parsed)
    }
}

/// Upper bound on resolution in angstroms. Records above the ceiling, and
/// records with no resolution at all, are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ResolutionCeiling(f64);

impl ResolutionCeiling {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    pub fn new(value: f64) -> Result<Self, ScoutError> {
        if !value.is_finite() || value < Self::MIN || value > Self::MAX {
            return Err(ScoutError::InvalidResolutionCeiling(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for ResolutionCeiling {
    fn default() -> Self {
        Self(3.0)
    }
}

impl TryFrom<f64> for ResolutionCeiling {
    type Error = ScoutError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResolutionCeiling> for f64 {
    fn from(value: ResolutionCeiling) -> Self {
        value.0
    }
}

impl FromStr for ResolutionCeiling {
    type Err = ScoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .parse::<f64>()
            .map_err(|_| ScoutError::InvalidResolutionCeiling(f64::NAN))?;
        Self::new(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MethodFilter {
    Any,
    #[value(name = "x-ray")]
    #[serde(rename = "x-ray")]
    Xray,
    #[value(name = "em")]
    Em,
    #[value(name = "nmr")]
    Nmr,
}

impl MethodFilter {
    /// Substring matched case-insensitively against the record's method
    /// string; `None` disables the predicate.
    pub fn pattern(&self) -> Option<&'static str> {
        match self {
            MethodFilter::Any => None,
            MethodFilter::Xray => Some("X-RAY"),
            MethodFilter::Em => Some("ELECTRON MICROSCOPY"),
            MethodFilter::Nmr => Some("NMR"),
        }
    }
}

impl Default for MethodFilter {
    fn default() -> Self {
        MethodFilter::Any
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => write!(f, "Any"),
            MethodFilter::Xray => write!(f, "X-RAY"),
            MethodFilter::Em => write!(f, "ELECTRON MICROSCOPY"),
            MethodFilter::Nmr => write!(f, "NMR"),
        }
    }
}

/// One flat row of enriched entry metadata. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryRecord {
    pub id: EntryId,
    pub title: String,
    pub method: String,
    pub resolution: Option<f64>,
    /// Deduplicated source organisms, sorted and comma-joined; "Unknown"
    /// when no polymer entity named one.
    pub organism: String,
    /// Count of distinct chain labels across all polymer entities, not the
    /// entity count.
    pub chain_count: usize,
}
