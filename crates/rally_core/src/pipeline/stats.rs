//! Per-run counters for the pipeline.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::events::Event;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub frames_without_ball: u64,
    /// Detector firings before merging
    pub raw_events: u64,
    /// Records left after the run-length merge
    pub merged_events: u64,
    pub calibrations_computed: u64,
    pub events_by_kind: BTreeMap<String, u64>,
}

impl PipelineStats {
    pub fn record_frame(&mut self, has_ball: bool) {
        self.frames_processed += 1;
        if !has_ball {
            self.frames_without_ball += 1;
        }
    }

    pub fn record_event(&mut self, event: Event) {
        self.raw_events += 1;
        *self.events_by_kind.entry(event.name().to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, event: Event) -> u64 {
        self.events_by_kind.get(event.name()).copied().unwrap_or(0)
    }
}
