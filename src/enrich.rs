use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;

use serde::Serialize;

use crate::data::{DataClient, parse_entry, parse_polymer_entity};
use crate::domain::{Concurrency, EntryId, EntryRecord};
use crate::error::ScoutError;

/// Outcome of one enrichment batch. `records` holds one record per
/// identifier whose whole fetch chain succeeded, in completion order;
/// `failures` names the identifiers that were dropped and why. Failed
/// identifiers contribute no partial record and are not retried.
#[derive(Debug, Default, Serialize)]
pub struct EnrichReport {
    pub records: Vec<EntryRecord>,
    pub failures: Vec<EnrichFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichFailure {
    pub id: EntryId,
    pub reason: String,
}

enum Outcome {
    Fetched(EntryRecord),
    Failed(EnrichFailure),
}

/// Run up to `concurrency` independent per-identifier fetch chains over a
/// shared task queue. Workers drain the queue and send outcomes through a
/// channel; the scope join is the collection barrier. Within one chain the
/// polymer entity fetches are sequential.
pub fn run<D: DataClient>(client: &D, ids: &[EntryId], concurrency: Concurrency) -> EnrichReport {
    if ids.is_empty() {
        return EnrichReport::default();
    }

    let queue: Mutex<VecDeque<EntryId>> = Mutex::new(ids.iter().cloned().collect());
    let (tx, rx) = mpsc::channel::<Outcome>();
    let workers = concurrency.get().min(ids.len());

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            scope.spawn(move || {
                loop {
                    let next = match queue.lock() {
                        Ok(mut guard) => guard.pop_front(),
                        Err(_) => None,
                    };
                    let Some(id) = next else { break };
                    let outcome = match fetch_record(client, &id) {
                        Ok(record) => Outcome::Fetched(record),
                        Err(err) => {
                            tracing::debug!(id = %id, error = %err, "entry enrichment failed");
                            Outcome::Failed(EnrichFailure {
                                id,
                                reason: err.to_string(),
                            })
                        }
                    };
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);
    });

    let mut report = EnrichReport::default();
    for outcome in rx.try_iter() {
        match outcome {
            Outcome::Fetched(record) => report.records.push(record),
            Outcome::Failed(failure) => report.failures.push(failure),
        }
    }
    report
}

/// One identifier's full fetch chain: entry metadata, then each polymer
/// entity in order, aggregated into a flat record.
pub fn fetch_record<D: DataClient + ?Sized>(
    client: &D,
    id: &EntryId,
) -> Result<EntryRecord, ScoutError> {
    let entry = parse_entry(&client.fetch_entry(id)?);

    let mut organisms = BTreeSet::new();
    let mut chains = HashSet::new();
    for entity_id in &entry.polymer_entity_ids {
        let entity = parse_polymer_entity(&client.fetch_polymer_entity(id, entity_id)?);
        if let Some(organism) = entity.organism {
            organisms.insert(organism);
        }
        chains.extend(entity.chain_labels);
    }

    let organism = if organisms.is_empty() {
        "Unknown".to_string()
    } else {
        organisms.into_iter().collect::<Vec<_>>().join(", ")
    };

    Ok(EntryRecord {
        id: id.clone(),
        title: entry.title,
        method: entry.method,
        resolution: entry.resolution,
        organism,
        chain_count: chains.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::{Value, json};

    use super::*;
    use crate::domain::Concurrency;

    struct MapData {
        entries: HashMap<String, Value>,
        entities: HashMap<(String, String), Value>,
    }

    impl DataClient for MapData {
        fn fetch_entry(&self, id: &EntryId) -> Result<Value, ScoutError> {
            self.entries
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| ScoutError::DataStatus {
                    status: 404,
                    message: "entry not found".to_string(),
                })
        }

        fn fetch_polymer_entity(&self, id: &EntryId, entity_id: &str) -> Result<Value, ScoutError> {
            self.entities
                .get(&(id.as_str().to_string(), entity_id.to_string()))
                .cloned()
                .ok_or_else(|| ScoutError::DataStatus {
                    status: 404,
                    message: "entity not found".to_string(),
                })
        }
    }

    fn entry(title: &str, method: &str, resolution: Option<f64>, entities: &[&str]) -> Value {
        json!({
            "struct": { "title": title },
            "exptl": [ { "method": method } ],
            "rcsb_entry_info": { "resolution_combined": [resolution] },
            "rcsb_entry_container_identifiers": { "polymer_entity_ids": entities }
        })
    }

    fn entity(organism: &str, chains: &[&str]) -> Value {
        json!({
            "rcsb_entity_source_organism": [ { "scientific_name": organism } ],
            "rcsb_polymer_entity_container_identifiers": { "auth_asym_ids": chains }
        })
    }

    fn two_entry_fixture() -> MapData {
        let mut entries = HashMap::new();
        let mut entities = HashMap::new();
        entries.insert(
            "1AAA".to_string(),
            entry("Kinase", "X-RAY DIFFRACTION", Some(1.8), &["1", "2"]),
        );
        entities.insert(
            ("1AAA".to_string(), "1".to_string()),
            entity("Homo sapiens", &["A", "B"]),
        );
        entities.insert(
            ("1AAA".to_string(), "2".to_string()),
            entity("Mus musculus", &["B", "C"]),
        );
        entries.insert(
            "2BBB".to_string(),
            entry("Receptor", "ELECTRON MICROSCOPY", None, &["1"]),
        );
        entities.insert(
            ("2BBB".to_string(), "1".to_string()),
            entity("Homo sapiens", &["A"]),
        );
        MapData { entries, entities }
    }

    fn ids(raw: &[&str]) -> Vec<EntryId> {
        raw.iter().map(|id| id.parse().unwrap()).collect()
    }

    #[test]
    fn record_aggregates_organisms_and_distinct_chains() {
        let data = two_entry_fixture();
        let record = fetch_record(&data, &"1AAA".parse().unwrap()).unwrap();
        assert_eq!(record.organism, "Homo sapiens, Mus musculus");
        assert_eq!(record.chain_count, 3);
        assert_eq!(record.resolution, Some(1.8));
    }

    #[test]
    fn failed_entry_lands_in_failures_not_records() {
        let data = two_entry_fixture();
        let report = run(
            &data,
            &ids(&["1AAA", "9NOP"]),
            Concurrency::new(2).unwrap(),
        );
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id.as_str(), "9NOP");
    }

    #[test]
    fn failed_entity_drops_the_whole_entry() {
        let mut data = two_entry_fixture();
        data.entities
            .remove(&("1AAA".to_string(), "2".to_string()));
        let report = run(&data, &ids(&["1AAA"]), Concurrency::new(1).unwrap());
        assert!(report.records.is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn concurrency_does_not_change_record_content() {
        let data = two_entry_fixture();
        let batch = ids(&["1AAA", "2BBB"]);

        let sort = |mut records: Vec<EntryRecord>| {
            records.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
            records
        };
        let serial = sort(run(&data, &batch, Concurrency::new(1).unwrap()).records);
        let parallel = sort(run(&data, &batch, Concurrency::new(20).unwrap()).records);
        assert_eq!(serial, parallel);
        assert_eq!(serial.len(), 2);
    }

    #[test]
    fn empty_batch_is_an_empty_report() {
        let data = two_entry_fixture();
        let report = run(&data, &[], Concurrency::default());
        assert!(report.records.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn entry_without_entities_has_unknown_organism() {
        let mut entries = HashMap::new();
        entries.insert(
            "3CCC".to_string(),
            entry("Peptide", "SOLUTION NMR", None, &[]),
        );
        let data = MapData {
            entries,
            entities: HashMap::new(),
        };
        let record = fetch_record(&data, &"3CCC".parse().unwrap()).unwrap();
        assert_eq!(record.organism, "Unknown");
        assert_eq!(record.chain_count, 0);
    }
}
