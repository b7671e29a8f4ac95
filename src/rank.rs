use crate::domain::EntryRecord;

const XRAY_PATTERN: &str = "X-RAY";
const TOP_N: usize = 3;

/// Top X-ray structures: restrict to methods containing "X-RAY"
/// (case-insensitive), order ascending by resolution, keep at most three.
pub fn top_xray(records: &[EntryRecord]) -> Vec<EntryRecord> {
    let mut ranked: Vec<EntryRecord> = records
        .iter()
        .filter(|record| record.method.to_uppercase().contains(XRAY_PATTERN))
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        let a = a.resolution.unwrap_or(f64::INFINITY);
        let b = b.resolution.unwrap_or(f64::INFINITY);
        a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(TOP_N);
    ranked
}
