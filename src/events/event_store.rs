use eyre::{Result, WrapErr};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument};

use super::seed::seed_events;
use super::types::{EventFilter, NewPolicyEvent, PolicyEvent};
use crate::error::CoreResult;

#[derive(Debug)]
struct StoreInner {
    events: Vec<PolicyEvent>,
    next_id: u64,
}

/// Append-only, process-local collection of policy events.
///
/// Every read and write goes through one mutex, so a store shared behind an
/// `Arc` never loses an update.
#[derive(Debug)]
pub struct EventStore {
    inner: Mutex<StoreInner>,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                events: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Store pre-populated with the curated seed events
    pub fn seeded() -> Self {
        let store = Self::new();
        for event in seed_events() {
            // Seed records are static and valid
            if let Err(e) = store.add(event) {
                tracing::error!(error = %e, "Invalid seed event skipped");
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, assign the next id and append
    #[instrument(skip(self, event), fields(country = %event.country, severity = event.severity))]
    pub fn add(&self, event: NewPolicyEvent) -> CoreResult<PolicyEvent> {
        let mut inner = self.lock();
        let event = event.into_event(inner.next_id)?;
        inner.next_id += 1;
        inner.events.push(event.clone());
        debug!(id = event.id, date = %event.date, "Policy event added");
        Ok(event)
    }

    /// Matching events ordered by date, then id
    pub fn list(&self, filter: &EventFilter) -> Vec<PolicyEvent> {
        let inner = self.lock();
        let mut events: Vec<PolicyEvent> = inner.events.iter().filter(|e| filter.matches(e)).cloned().collect();
        events.sort_by_key(|e| (e.date, e.id));
        events
    }

    pub fn all(&self) -> Vec<PolicyEvent> {
        self.list(&EventFilter::default())
    }

    pub fn get(&self, id: u64) -> Option<PolicyEvent> {
        self.lock().events.iter().find(|e| e.id == id).cloned()
    }

    /// Most recent event by date
    pub fn latest(&self) -> Option<PolicyEvent> {
        self.all().pop()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_by_country(&self) -> BTreeMap<String, usize> {
        let inner = self.lock();
        let mut counts = BTreeMap::new();
        for event in &inner.events {
            *counts.entry(event.country.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn countries(&self) -> Vec<String> {
        self.count_by_country().into_keys().collect()
    }

    /// Write every event as a JSON array; returns the number written
    #[instrument(skip(self))]
    pub fn export_json(&self, path: &Path) -> Result<usize> {
        let events = self.all();
        let json = serde_json::to_string_pretty(&events)?;
        fs::write(path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        info!(count = events.len(), path = %path.display(), "Exported policy events");
        Ok(events.len())
    }

    /// Append events from a JSON array written by [`export_json`](Self::export_json).
    ///
    /// Records are re-validated and receive fresh ids from this store. A file
    /// with any invalid record is rejected as a whole.
    #[instrument(skip(self))]
    pub fn import_json(&self, path: &Path) -> Result<usize> {
        let raw = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let records: Vec<NewPolicyEvent> = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("Malformed event file {}", path.display()))?;

        let mut inner = self.lock();
        let first_id = inner.next_id;
        let events = records
            .into_iter()
            .zip(first_id..)
            .map(|(record, id)| record.into_event(id))
            .collect::<CoreResult<Vec<PolicyEvent>>>()
            .wrap_err_with(|| format!("Invalid record in {}", path.display()))?;

        let imported = events.len();
        inner.next_id = first_id + imported as u64;
        inner.events.extend(events);
        info!(count = imported, path = %path.display(), "Imported policy events");
        Ok(imported)
    }
}
