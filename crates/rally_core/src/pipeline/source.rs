//! Collaborator seams: where frames and court calibrations come from.
//!
//! Object detection, tracking and corner detection all happen upstream; the
//! pipeline only sees their results through these two traits.

use tracing::{debug, trace, warn};

use crate::config::CourtSpec;
use crate::error::{PipelineError, Result};
use crate::frame::RawFrame;
use crate::geometry::{CoordinateNormalizer, CourtCorners};

/// Upstream tracker output. Blocks until the next frame is ready; `None`
/// marks the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<RawFrame>;
}

impl<I> FrameSource for I
where
    I: Iterator<Item = RawFrame>,
{
    fn next_frame(&mut self) -> Option<RawFrame> {
        self.next()
    }
}

/// Supplies the pixel-space court corners for a frame.
pub trait CourtCalibrator {
    fn calibrate(&mut self, frame: &RawFrame) -> Result<CourtCorners>;
}

/// Same corners for the whole stream (static camera).
#[derive(Debug, Clone, Copy)]
pub struct FixedCalibration {
    corners: CourtCorners,
}

impl FixedCalibration {
    pub fn new(corners: CourtCorners) -> Self {
        Self { corners }
    }
}

impl CourtCalibrator for FixedCalibration {
    fn calibrate(&mut self, _frame: &RawFrame) -> Result<CourtCorners> {
        Ok(self.corners)
    }
}

/// Uses the corners the tracker attached to each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCalibration;

impl CourtCalibrator for FrameCalibration {
    fn calibrate(&mut self, frame: &RawFrame) -> Result<CourtCorners> {
        frame
            .court
            .ok_or(PipelineError::CalibrationUnavailable { frame_index: frame.index })
    }
}

/// Keeps the last solved transform and re-solves only when the corners
/// change.
#[derive(Debug, Clone)]
pub struct CalibrationCache {
    court: CourtSpec,
    always_recompute: bool,
    current: Option<(CourtCorners, CoordinateNormalizer)>,
    computed: u64,
}

impl CalibrationCache {
    pub fn new(court: CourtSpec, always_recompute: bool) -> Self {
        Self { court, always_recompute, current: None, computed: 0 }
    }

    pub fn normalizer_for(&mut self, corners: &CourtCorners) -> Result<&CoordinateNormalizer> {
        let reusable = !self.always_recompute
            && matches!(&self.current, Some((cached, _)) if cached == corners);

        if !reusable {
            let normalizer = CoordinateNormalizer::new(corners, self.court).map_err(|e| {
                warn!(error = %e, "court calibration rejected");
                e
            })?;
            self.computed += 1;
            debug!(computed = self.computed, "perspective transform solved");
            self.current = Some((*corners, normalizer));
        } else {
            trace!("reusing cached perspective transform");
        }

        match &self.current {
            Some((_, normalizer)) => Ok(normalizer),
            None => Err(PipelineError::InvalidCalibration("no transform available".to_string())),
        }
    }

    /// Number of times a transform has been solved.
    pub fn computed(&self) -> u64 {
        self.computed
    }
}
