use std::io::{Cursor, Write};

use serde::Serialize;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::domain::EntryId;
use crate::error::ScoutError;
use crate::files::FileClient;

/// A finished archive plus the manifest of identifiers that were skipped.
/// Structure fetches that fail do not abort the build; they are recorded and
/// the remaining entries are still written. An empty identifier list yields
/// a valid zip with zero entries.
#[derive(Debug, Serialize)]
pub struct ArchiveReport {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub entries: Vec<EntryId>,
    pub failures: Vec<ArchiveFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveFailure {
    pub id: EntryId,
    pub reason: String,
}

pub fn build_archive<F: FileClient + ?Sized>(
    client: &F,
    ids: &[EntryId],
) -> Result<ArchiveReport, ScoutError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut entries = Vec::new();
    let mut failures = Vec::new();

    for id in ids {
        let text = match client.fetch_structure(id) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "skipping structure in archive");
                failures.push(ArchiveFailure {
                    id: id.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        writer
            .start_file(format!("{}.pdb", id.as_str()), options)
            .map_err(|err| ScoutError::Archive(err.to_string()))?;
        writer
            .write_all(text.as_bytes())
            .map_err(|err| ScoutError::Archive(err.to_string()))?;
        entries.push(id.clone());
    }

    let cursor = writer
        .finish()
        .map_err(|err| ScoutError::Archive(err.to_string()))?;

    Ok(ArchiveReport {
        bytes: cursor.into_inner(),
        entries,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    struct FixedFiles;

    impl FileClient for FixedFiles {
        fn fetch_structure(&self, id: &EntryId) -> Result<String, ScoutError> {
            if id.as_str() == "9BAD" {
                return Err(ScoutError::FileStatus {
                    status: 404,
                    message: "not found".to_string(),
                });
            }
            Ok(format!("HEADER    {}\nEND\n", id.as_str()))
        }
    }

    fn ids(raw: &[&str]) -> Vec<EntryId> {
        raw.iter().map(|id| id.parse().unwrap()).collect()
    }

    fn open(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn empty_input_builds_a_valid_empty_archive() {
        let report = build_archive(&FixedFiles, &[]).unwrap();
        assert!(report.entries.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(open(report.bytes).len(), 0);
    }

    #[test]
    fn entries_are_named_by_identifier() {
        let report = build_archive(&FixedFiles, &ids(&["6LU7", "4HHB"])).unwrap();
        let mut archive = open(report.bytes);
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("6LU7.pdb")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains("HEADER    6LU7"));
    }

    #[test]
    fn failed_fetch_is_skipped_and_recorded() {
        let report = build_archive(&FixedFiles, &ids(&["6LU7", "9BAD", "4HHB"])).unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id.as_str(), "9BAD");

        let archive = open(report.bytes);
        assert_eq!(archive.len(), 2);
    }
}
