//! Event log and run-length merge.
//!
//! Detectors fire on every tick the condition holds, so a bounce seen over
//! three consecutive frames lands in the log three times. `merge` collapses
//! each run of adjacent identical names into the run's first record.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Event, EventRecord};

/// Append-only, chronological log of detector firings.
#[derive(Debug, Clone, Default)]
pub struct EventAggregator {
    records: Vec<EventRecord>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unconditionally; duplicates are kept until `merge`.
    pub fn add_event(&mut self, frame_index: u64, event_name: impl Into<String>) {
        self.records.push(EventRecord::new(frame_index, event_name));
    }

    pub fn record(&mut self, frame_index: u64, event: Event) {
        self.add_event(frame_index, event.name());
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compressed copy of the log. The log itself is left untouched.
    pub fn merge(&self) -> Timeline {
        Timeline { records: merge_consecutive(&self.records) }
    }
}

/// Collapse maximal runs of adjacent records with the same event name into
/// the first record of each run.
pub fn merge_consecutive(records: &[EventRecord]) -> Vec<EventRecord> {
    let mut merged: Vec<EventRecord> = Vec::with_capacity(records.len());
    for record in records {
        match merged.last() {
            Some(last) if last.event_name == record.event_name => {}
            _ => merged.push(record.clone()),
        }
    }
    merged
}

/// Merged event timeline, serialized as a bare JSON array of
/// `{"frameIndex": .., "event": ..}` objects in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Timeline {
    records: Vec<EventRecord>,
}

impl Timeline {
    /// Wrap records as-is, without merging.
    pub fn from_records(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Merge again; a no-op on a timeline produced by `EventAggregator::merge`.
    pub fn merged(&self) -> Timeline {
        Timeline { records: merge_consecutive(&self.records) }
    }

    pub fn into_records(self) -> Vec<EventRecord> {
        self.records
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// JSON schema of the serialized timeline.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Timeline)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a EventRecord;
    type IntoIter = std::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
