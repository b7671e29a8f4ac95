use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::domain::{EntryRecord, MethodFilter, ResolutionCeiling};

pub const HUMAN_ORGANISM: &str = "Homo sapiens";

/// Active predicate set. The organism, monomer, and method predicates are
/// optional; the resolution ceiling always applies and drops records with no
/// resolution value.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub only_human: bool,
    pub monomer_only: bool,
    pub max_resolution: ResolutionCeiling,
    pub method: MethodFilter,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            only_human: false,
            monomer_only: false,
            max_resolution: ResolutionCeiling::default(),
            method: MethodFilter::Any,
        }
    }
}

impl From<&ResolvedConfig> for FilterOptions {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            only_human: config.only_human,
            monomer_only: config.monomer_only,
            max_resolution: config.max_resolution,
            method: config.method,
        }
    }
}

/// Pure predicate conjunction. Keeps input order; does not sort.
pub fn apply(records: &[EntryRecord], options: &FilterOptions) -> Vec<EntryRecord> {
    records
        .iter()
        .filter(|record| matches(record, options))
        .cloned()
        .collect()
}

fn matches(record: &EntryRecord, options: &FilterOptions) -> bool {
    if options.only_human && !record.organism.contains(HUMAN_ORGANISM) {
        return false;
    }
    if options.monomer_only && record.chain_count != 1 {
        return false;
    }
    if let Some(pattern) = options.method.pattern() {
        if !record.method.to_uppercase().contains(pattern) {
            return false;
        }
    }
    match record.resolution {
        Some(resolution) => resolution <= options.max_resolution.get(),
        None => false,
    }
}

/// Display order: ascending by resolution, records without one last.
pub fn sort_for_display(records: &mut [EntryRecord]) {
    records.sort_by(|a, b| {
        let a = a.resolution.unwrap_or(f64::INFINITY);
        let b = b.resolution.unwrap_or(f64::INFINITY);
        a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
    });
}
