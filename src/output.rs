use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, Session};
use crate::archive::ArchiveReport;
use crate::domain::EntryRecord;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Machine-readable output for non-interactive runs. Progress events are
/// swallowed; only the final JSON document reaches stdout.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_session(session: &Session) -> io::Result<()> {
        Self::print_json(session)
    }

    pub fn print_records(records: &[EntryRecord]) -> io::Result<()> {
        Self::print_json(&records)
    }

    pub fn print_archive(report: &ArchiveReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Plain-text progress on stderr for interactive runs.
pub struct TextProgress;

impl ProgressSink for TextProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}

/// Fixed-width results table with the dashboard's columns.
pub fn render_table(records: &[EntryRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<48} {:<24} {:>8} {:<28} {:>6}\n",
        "PDB ID", "Title", "Method", "Res (Å)", "Organism", "Chains"
    ));
    for record in records {
        let resolution = record
            .resolution
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<6} {:<48} {:<24} {:>8} {:<28} {:>6}\n",
            record.id.as_str(),
            truncate(&record.title, 48),
            truncate(&record.method, 24),
            resolution,
            truncate(&record.organism, 28),
            record.chain_count
        ));
    }
    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let cut: String = value.chars().take(width.saturating_sub(1)).collect();
    format!("{cut}…")
}
