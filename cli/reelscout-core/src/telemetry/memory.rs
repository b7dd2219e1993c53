use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use reelscout_catalog::MovieSummary;
use tracing::debug;

use super::{SinkError, TelemetryRecord, TelemetrySink, normalize_term};

/// In-process telemetry store.
///
/// Used when no document store is configured. Clones share the same records.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Arc<Mutex<BTreeMap<String, TelemetryRecord>>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call with [`SinkError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// The record counted under `term`, if any. `term` is normalized first.
    pub fn get(&self, term: &str) -> Option<TelemetryRecord> {
        self.records
            .lock()
            .expect("telemetry records lock poisoned")
            .get(&normalize_term(term))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .expect("telemetry records lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), SinkError> {
        if self.unavailable {
            return Err(SinkError::Unavailable(None));
        }
        Ok(())
    }
}

impl TelemetrySink for MemoryStore {
    async fn record(&self, query: &str, top_result: &MovieSummary) -> Result<(), SinkError> {
        self.check_available()?;

        let term = normalize_term(query);
        let mut records = self.records.lock().expect("telemetry records lock poisoned");
        match records.get_mut(&term) {
            Some(record) => {
                record.count += 1;
                debug!(term = %term, count = record.count, "incremented search count");
            },
            None => {
                debug!(term = %term, movie_id = top_result.id, "created search record");
                let record = TelemetryRecord::first(term.clone(), top_result);
                records.insert(term, record);
            },
        }
        Ok(())
    }

    async fn trending(&self, limit: usize) -> Result<Vec<TelemetryRecord>, SinkError> {
        self.check_available()?;

        let records = self.records.lock().expect("telemetry records lock poisoned");
        let mut trending = records.values().cloned().collect::<Vec<_>>();
        // stable sort keeps ties in term order
        trending.sort_by(|a, b| b.count.cmp(&a.count));
        trending.truncate(limit);
        Ok(trending)
    }
}
