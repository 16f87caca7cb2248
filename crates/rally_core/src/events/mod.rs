//! # Rally Events
//!
//! Semantic events detected from the ball track, and the chronological log
//! they are recorded into.
//!
//! - `detectors` - stateless analyzers over the sliding window
//! - `aggregator` - append-only event log with run-length merge

pub mod aggregator;
pub mod detectors;

pub use aggregator::{merge_consecutive, EventAggregator, Timeline};
pub use detectors::{BounceOrShotTester, DetectorSet, EventDetector, SideTester};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Event {
    Rally,
    Bounce,
    Shot,
    RightOfNet,
    LeftOfNet,
}

impl Event {
    pub const ALL: [Event; 5] =
        [Event::Rally, Event::Bounce, Event::Shot, Event::RightOfNet, Event::LeftOfNet];

    /// Name written to the timeline.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Rally => "Rally",
            Event::Bounce => "Bounce",
            Event::Shot => "Shot",
            Event::RightOfNet => "RightOfNet",
            Event::LeftOfNet => "LeftOfNet",
        }
    }

    pub fn from_name(name: &str) -> Option<Event> {
        Event::ALL.iter().copied().find(|e| e.name() == name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One detector firing, as it appears on the output timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    #[serde(rename = "frameIndex")]
    pub frame_index: u64,
    #[serde(rename = "event")]
    pub event_name: String,
}

impl EventRecord {
    pub fn new(frame_index: u64, event_name: impl Into<String>) -> Self {
        Self { frame_index, event_name: event_name.into() }
    }

    /// The typed event, when the name is one this crate emits.
    pub fn event(&self) -> Option<Event> {
        Event::from_name(&self.event_name)
    }
}
