use std::fs;

use pdb_scout::data::DataClient;
use pdb_scout::domain::EntryId;
use pdb_scout::enrich::fetch_record;
use pdb_scout::error::ScoutError;

/// Serves the recorded 6LU7 responses from disk.
struct FixtureData;

fn load(name: &str) -> serde_json::Value {
    let raw = fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

impl DataClient for FixtureData {
    fn fetch_entry(&self, id: &EntryId) -> Result<serde_json::Value, ScoutError> {
        match id.as_str() {
            "6LU7" => Ok(load("entry_6LU7.json")),
            _ => Err(ScoutError::DataStatus {
                status: 404,
                message: "entry not found".to_string(),
            }),
        }
    }

    fn fetch_polymer_entity(
        &self,
        id: &EntryId,
        entity_id: &str,
    ) -> Result<serde_json::Value, ScoutError> {
        match (id.as_str(), entity_id) {
            ("6LU7", "1") => Ok(load("polymer_entity_6LU7_1.json")),
            ("6LU7", "2") => Ok(load("polymer_entity_6LU7_2.json")),
            _ => Err(ScoutError::DataStatus {
                status: 404,
                message: "entity not found".to_string(),
            }),
        }
    }
}

#[test]
fn enrich_6lu7_from_recorded_responses() {
    let record = fetch_record(&FixtureData, &"6LU7".parse().unwrap()).unwrap();

    assert_eq!(record.id.as_str(), "6LU7");
    assert!(record.title.contains("COVID-19 main protease"));
    assert_eq!(record.method, "X-RAY DIFFRACTION");
    assert_eq!(record.resolution, Some(2.16));
    // Two organisms, sorted and comma-joined.
    assert_eq!(
        record.organism,
        "Severe acute respiratory syndrome coronavirus 2, synthetic construct"
    );
    // Chains A and C across the two entities.
    assert_eq!(record.chain_count, 2);
}

#[test]
fn unknown_entry_is_an_error() {
    let err = fetch_record(&FixtureData, &"0XXX".parse().unwrap()).unwrap_err();
    assert!(matches!(err, ScoutError::DataStatus { status: 404, .. }));
}
