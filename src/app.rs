use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::archive::{ArchiveReport, build_archive};
use crate::cache::TtlCache;
use crate::config::ResolvedConfig;
use crate::data::DataClient;
use crate::domain::{Concurrency, EntryId, EntryRecord, Query};
use crate::enrich::{self, EnrichFailure};
use crate::error::ScoutError;
use crate::files::FileClient;
use crate::filter::{self, FilterOptions};
use crate::rank;
use crate::search::SearchClient;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Result of one search interaction. Built fresh per run and torn down with
/// it; nothing persists across process restarts.
#[derive(Debug, Serialize)]
pub struct Session {
    pub query: Query,
    pub filters: FilterOptions,
    /// Identifiers the search stage returned.
    pub raw_count: usize,
    /// Records that survived the predicate conjunction.
    pub filtered_count: usize,
    /// Filtered records in display order (ascending resolution).
    pub records: Vec<EntryRecord>,
    /// Identifiers dropped during enrichment, with reasons.
    pub dropped: Vec<EnrichFailure>,
    pub searched_at: String,
}

pub struct App<S: SearchClient, D: DataClient, F: FileClient> {
    search: S,
    data: D,
    files: F,
    search_cache: Mutex<TtlCache<String, Vec<EntryId>>>,
    record_cache: Mutex<TtlCache<EntryId, EntryRecord>>,
}

impl<S: SearchClient, D: DataClient, F: FileClient> App<S, D, F> {
    pub fn new(search: S, data: D, files: F, config: &ResolvedConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            search,
            data,
            files,
            search_cache: Mutex::new(TtlCache::new(config.cache_capacity, ttl)),
            record_cache: Mutex::new(TtlCache::new(config.cache_capacity * 16, ttl)),
        }
    }

    /// The full pipeline: search, enrich under the worker pool, filter, sort
    /// for display. An empty search result is surfaced as `NoEntriesFound`;
    /// an empty filtered set is a valid session with zero records.
    pub fn run_search(
        &self,
        query: &Query,
        filters: &FilterOptions,
        concurrency: Concurrency,
        sink: &dyn ProgressSink,
    ) -> Result<Session, ScoutError> {
        sink.event(ProgressEvent {
            message: format!("phase=Search; querying for {}", query.normalized()),
            elapsed: None,
        });
        let start = Instant::now();
        let ids = self.search_entries(query);
        sink.event(ProgressEvent {
            message: format!("search.response hits={}", ids.len()),
            elapsed: Some(start.elapsed()),
        });
        if ids.is_empty() {
            return Err(ScoutError::NoEntriesFound(query.normalized().to_string()));
        }

        sink.event(ProgressEvent {
            message: format!(
                "phase=Enrich; fetching metadata for {} entries (workers={})",
                ids.len(),
                concurrency.get()
            ),
            elapsed: None,
        });
        let start = Instant::now();
        let (records, dropped) = self.enrich_entries(&ids, concurrency);
        sink.event(ProgressEvent {
            message: format!(
                "enrich.done records={} dropped={}",
                records.len(),
                dropped.len()
            ),
            elapsed: Some(start.elapsed()),
        });

        sink.event(ProgressEvent {
            message: "phase=Filter; applying predicates".to_string(),
            elapsed: None,
        });
        let mut filtered = filter::apply(&records, filters);
        filter::sort_for_display(&mut filtered);

        Ok(Session {
            query: query.clone(),
            filters: filters.clone(),
            raw_count: ids.len(),
            filtered_count: filtered.len(),
            records: filtered,
            dropped,
            searched_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Two-stage search, memoized by trimmed query text. Empty result sets
    /// are cached too; a repeated hopeless query should not hit the network
    /// again within the TTL.
    pub fn search_entries(&self, query: &Query) -> Vec<EntryId> {
        let key = query.normalized().to_string();
        if let Ok(mut cache) = self.search_cache.lock() {
            if let Some(ids) = cache.get(&key) {
                tracing::debug!(query = %key, "search cache hit");
                return ids;
            }
        }
        let ids = self.search.search(query);
        if let Ok(mut cache) = self.search_cache.lock() {
            cache.insert(key, ids.clone());
        }
        ids
    }

    fn enrich_entries(
        &self,
        ids: &[EntryId],
        concurrency: Concurrency,
    ) -> (Vec<EntryRecord>, Vec<EnrichFailure>) {
        let mut records = Vec::new();
        let mut to_fetch = Vec::new();
        if let Ok(mut cache) = self.record_cache.lock() {
            for id in ids {
                match cache.get(id) {
                    Some(record) => records.push(record),
                    None => to_fetch.push(id.clone()),
                }
            }
        } else {
            to_fetch = ids.to_vec();
        }

        let report = enrich::run(&self.data, &to_fetch, concurrency);
        if let Ok(mut cache) = self.record_cache.lock() {
            for record in &report.records {
                cache.insert(record.id.clone(), record.clone());
            }
        }
        records.extend(report.records);
        (records, report.failures)
    }

    pub fn rank(&self, session: &Session) -> Vec<EntryRecord> {
        rank::top_xray(&session.records)
    }

    /// Archive over every record in the filtered set.
    pub fn build_filtered_archive(&self, session: &Session) -> Result<ArchiveReport, ScoutError> {
        let ids: Vec<EntryId> = session.records.iter().map(|r| r.id.clone()).collect();
        build_archive(&self.files, &ids)
    }

    /// Archive over the top-3 X-ray subset.
    pub fn build_top_archive(&self, session: &Session) -> Result<ArchiveReport, ScoutError> {
        let ids: Vec<EntryId> = self.rank(session).iter().map(|r| r.id.clone()).collect();
        build_archive(&self.files, &ids)
    }

    /// Single-structure fetch for the viewer. Errors propagate; the caller
    /// surfaces them scoped to this interaction instead of dropping them.
    pub fn fetch_structure(&self, id: &EntryId) -> Result<String, ScoutError> {
        self.files.fetch_structure(id)
    }
}
