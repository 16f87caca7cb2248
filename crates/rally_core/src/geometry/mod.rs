//! # Court Geometry
//!
//! Pixel-space and court-space points, the calibrated court corners, and
//! the perspective transform between the two spaces.
//!
//! ## Coordinate Systems
//!
//! **Pixel space** (what the tracker reports):
//! - x: image column, y: image row, origin top-left of the video frame
//!
//! **Court space** (what the detectors consume), in meters:
//! - x: 0 = left singles sideline, 8.23 = right singles sideline
//! - y: 0 = far baseline, 23.77 = near baseline
//!
//! The detectors' net line is an x threshold (11.885 by default), which is
//! beyond the right sideline in this frame.
//!
//! A `Point2D` carries no unit of its own; the structure holding it decides
//! which space it is in.

pub mod homography;

pub use homography::CoordinateNormalizer;

use serde::{Deserialize, Serialize};

/// Singles court width (m)
pub const COURT_WIDTH_M: f64 = 8.23;

/// Baseline to baseline (m)
pub const COURT_LENGTH_M: f64 = 23.77;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// The four singles-court corners as seen by the camera.
///
/// `tl`/`tr` sit on the far baseline, `br`/`bl` on the near one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourtCorners {
    pub tl: Point2D,
    pub tr: Point2D,
    pub br: Point2D,
    pub bl: Point2D,
}

impl CourtCorners {
    pub fn new(tl: Point2D, tr: Point2D, br: Point2D, bl: Point2D) -> Self {
        Self { tl, tr, br, bl }
    }

    /// Corners in correspondence order: tl, tr, br, bl.
    pub fn as_array(&self) -> [Point2D; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    /// Apply `f` to every corner, failing if any corner fails.
    pub fn try_map<F>(&self, mut f: F) -> Option<CourtCorners>
    where
        F: FnMut(Point2D) -> Option<Point2D>,
    {
        Some(CourtCorners {
            tl: f(self.tl)?,
            tr: f(self.tr)?,
            br: f(self.br)?,
            bl: f(self.bl)?,
        })
    }
}
