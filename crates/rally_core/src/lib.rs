//! # rally_core - Tennis Rally Event Detection
//!
//! Turns per-frame tracker output (player and ball pixel positions plus the
//! four court corners) into a compressed timeline of rally events.
//!
//! ## Features
//! - Perspective normalization from pixels to court meters (4-point homography)
//! - Bounded sliding window of recent frames (5 s at 60 fps by default)
//! - Pluggable detectors: net-side crossings, bounce and shot
//! - Run-length merged JSON timeline
//!
//! ## Usage
//!
//! ```rust
//! use rally_core::config::PipelineConfig;
//! use rally_core::frame::RawFrame;
//! use rally_core::geometry::{CourtCorners, Point2D};
//! use rally_core::pipeline::process_frames;
//!
//! let corners = CourtCorners::new(
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(823.0, 0.0),
//!     Point2D::new(823.0, 2377.0),
//!     Point2D::new(0.0, 2377.0),
//! );
//! let frames = [1000.0, 1100.0, 1300.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, x)| RawFrame::new(i as u64).with_ball(*x, 400.0));
//!
//! let output = process_frames(frames, corners, PipelineConfig::default()).unwrap();
//! assert_eq!(output.timeline.records()[0].event_name, "RightOfNet");
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use events::{Event, EventAggregator, EventRecord, Timeline};
pub use frame::{NormalizedFrame, RawFrame, SlidingWindowBuffer};
pub use geometry::{CoordinateNormalizer, CourtCorners, Point2D};
pub use pipeline::{process_frames, PipelineDriver, PipelineOutput, PipelineStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
