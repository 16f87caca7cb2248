//! # Event Detection Pipeline
//!
//! Per-tick orchestration:
//! 1. Pull the next `RawFrame` from the frame source (`None` ends the run)
//! 2. Get the court corners for it and normalize it into court meters
//! 3. Push it into the sliding window (oldest frame evicted past capacity)
//! 4. Run every detector against the window and log what fired
//!
//! At end of stream the log is merged into the output `Timeline`.
//!
//! A calibration failure is fatal: the run stops and the error is returned.
//! Missing balls or short history only silence the detectors.

pub mod source;
pub mod stats;

pub use source::{
    CalibrationCache, CourtCalibrator, FixedCalibration, FrameCalibration, FrameSource,
};
pub use stats::PipelineStats;

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::events::{DetectorSet, Event, EventAggregator, Timeline};
use crate::frame::{RawFrame, SlidingWindowBuffer};
use crate::geometry::CourtCorners;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Done,
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub timeline: Timeline,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        self.timeline.to_json_pretty()
    }
}

pub struct PipelineDriver<S, C> {
    source: S,
    calibrator: C,
    config: PipelineConfig,
    calibration: CalibrationCache,
    window: SlidingWindowBuffer,
    detectors: DetectorSet,
    aggregator: EventAggregator,
    stats: PipelineStats,
    state: PipelineState,
}

impl<S: FrameSource, C: CourtCalibrator> PipelineDriver<S, C> {
    /// Driver with the standard detector registry.
    pub fn new(source: S, calibrator: C, config: PipelineConfig) -> Result<Self> {
        let detectors = DetectorSet::standard(&config.detectors);
        Self::with_detectors(source, calibrator, config, detectors)
    }

    pub fn with_detectors(
        source: S,
        calibrator: C,
        config: PipelineConfig,
        detectors: DetectorSet,
    ) -> Result<Self> {
        config.validate()?;

        let capacity = config.window.capacity();
        info!(capacity, detectors = detectors.len(), "rally pipeline ready");

        Ok(Self {
            source,
            calibrator,
            calibration: CalibrationCache::new(config.court, config.recalibrate_every_frame),
            window: SlidingWindowBuffer::new(capacity),
            detectors,
            aggregator: EventAggregator::new(),
            stats: PipelineStats::default(),
            state: PipelineState::Running,
            config,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn window(&self) -> &SlidingWindowBuffer {
        &self.window
    }

    pub fn aggregator(&self) -> &EventAggregator {
        &self.aggregator
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one frame. Returns `Done` once the source is exhausted; a
    /// calibration error also ends the run.
    pub fn step(&mut self) -> Result<PipelineState> {
        if self.state == PipelineState::Done {
            return Ok(PipelineState::Done);
        }

        let Some(raw) = self.source.next_frame() else {
            debug!(frames = self.stats.frames_processed, "end of frame stream");
            self.state = PipelineState::Done;
            return Ok(PipelineState::Done);
        };

        if let Err(e) = self.process_frame(&raw) {
            error!(frame = raw.index, error = %e, "aborting pipeline");
            self.state = PipelineState::Done;
            return Err(e);
        }

        Ok(PipelineState::Running)
    }

    fn process_frame(&mut self, raw: &RawFrame) -> Result<()> {
        let corners = self.calibrator.calibrate(raw)?;
        let normalizer = self.calibration.normalizer_for(&corners)?;
        let frame = raw.normalize(normalizer);

        self.stats.record_frame(frame.ball.is_some());
        self.window.push(frame);

        let fired = self.detectors.evaluate(&self.window, self.config.parallel_detectors);
        for event in &fired {
            self.aggregator.record(raw.index, *event);
            self.stats.record_event(*event);
        }

        if !fired.is_empty() {
            let names: Vec<&str> = fired.iter().map(Event::name).collect();
            debug!(frame = raw.index, events = %names.join(" | "), "events detected");
        }

        Ok(())
    }

    /// Drive to end of stream and merge.
    pub fn run(mut self) -> Result<PipelineOutput> {
        while self.step()? == PipelineState::Running {}
        Ok(self.finish())
    }

    /// Like [`run`](Self::run), but a raised `cancel` flag ends the stream
    /// early. Everything recorded so far is still merged.
    pub fn run_with_cancel(mut self, cancel: &AtomicBool) -> Result<PipelineOutput> {
        while !cancel.load(Ordering::Relaxed) {
            if self.step()? == PipelineState::Done {
                break;
            }
        }
        if self.state == PipelineState::Running {
            info!(frames = self.stats.frames_processed, "pipeline cancelled");
        }
        Ok(self.finish())
    }

    /// Stop (if still running) and merge the events recorded so far.
    pub fn finish(mut self) -> PipelineOutput {
        self.state = PipelineState::Done;

        let timeline = self.aggregator.merge();
        self.stats.merged_events = timeline.len() as u64;
        self.stats.calibrations_computed = self.calibration.computed();

        info!(
            frames = self.stats.frames_processed,
            raw_events = self.stats.raw_events,
            merged_events = self.stats.merged_events,
            "rally pipeline finished"
        );

        PipelineOutput { timeline, stats: self.stats }
    }
}

/// Run a whole recorded stream against one fixed calibration.
pub fn process_frames<I>(
    frames: I,
    corners: CourtCorners,
    config: PipelineConfig,
) -> Result<PipelineOutput>
where
    I: IntoIterator<Item = RawFrame>,
{
    PipelineDriver::new(frames.into_iter(), FixedCalibration::new(corners), config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::geometry::Point2D;

    /// 100 px per meter, no perspective.
    fn flat_court() -> CourtCorners {
        CourtCorners::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(823.0, 0.0),
            Point2D::new(823.0, 2377.0),
            Point2D::new(0.0, 2377.0),
        )
    }

    /// Frames numbered from 1 with the ball at the given court x (m).
    /// Crossing the default net needs x past 11.885, outside the sidelines.
    fn rally(ball_xs: &[Option<f64>]) -> Vec<RawFrame> {
        ball_xs
            .iter()
            .enumerate()
            .map(|(i, x)| {
                let frame = RawFrame::new(i as u64 + 1)
                    .with_player(1, 400.0, 100.0)
                    .with_player(2, 400.0, 2300.0);
                match x {
                    Some(x) => frame.with_ball(x * 100.0, 500.0),
                    None => frame,
                }
            })
            .collect()
    }

    fn sample_rally() -> Vec<RawFrame> {
        rally(&[
            Some(10.0),
            Some(10.5),
            Some(11.0),
            Some(12.5), // crosses to the right
            Some(13.0), // slows sharply
            Some(13.2), // slows again
            Some(12.0), // reverses
            Some(11.0), // back to the left
            None,
            Some(10.0),
            Some(9.0),
        ])
    }

    fn pairs(timeline: &Timeline) -> Vec<(u64, &str)> {
        timeline.iter().map(|r| (r.frame_index, r.event_name.as_str())).collect()
    }

    #[test]
    fn test_full_rally_timeline() {
        let output =
            process_frames(sample_rally(), flat_court(), PipelineConfig::default()).unwrap();

        assert_eq!(
            pairs(&output.timeline),
            vec![(4, "RightOfNet"), (5, "Bounce"), (7, "Shot"), (8, "LeftOfNet")]
        );
        assert_eq!(output.stats.frames_processed, 11);
        assert_eq!(output.stats.frames_without_ball, 1);
        assert_eq!(output.stats.raw_events, 5);
        assert_eq!(output.stats.merged_events, 4);
        assert_eq!(output.stats.count(Event::Bounce), 2);
        assert_eq!(output.stats.calibrations_computed, 1);
    }

    #[test]
    fn test_step_by_step_driving() {
        let mut driver = PipelineDriver::new(
            sample_rally().into_iter(),
            FixedCalibration::new(flat_court()),
            PipelineConfig::default(),
        )
        .unwrap();

        for _ in 0..4 {
            assert_eq!(driver.step().unwrap(), PipelineState::Running);
        }
        assert_eq!(driver.aggregator().len(), 1);
        assert_eq!(driver.window().len(), 4);

        while driver.step().unwrap() == PipelineState::Running {}
        assert_eq!(driver.state(), PipelineState::Done);
        assert_eq!(driver.step().unwrap(), PipelineState::Done);
        assert_eq!(driver.finish().timeline.len(), 4);
    }

    #[test]
    fn test_missing_ball_suppresses_events() {
        let frames = rally(&[Some(10.0), None, Some(13.0), None, Some(10.0)]);
        let output = process_frames(frames, flat_court(), PipelineConfig::default()).unwrap();
        assert!(output.timeline.is_empty());
        assert_eq!(output.stats.frames_without_ball, 2);
    }

    #[test]
    fn test_invalid_calibration_aborts() {
        let collinear = CourtCorners::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(100.0, 100.0),
            Point2D::new(200.0, 200.0),
            Point2D::new(300.0, 300.0),
        );
        let err = process_frames(sample_rally(), collinear, PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCalibration(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_frame_calibration_aborts_mid_stream() {
        let mut frames: Vec<RawFrame> =
            sample_rally().into_iter().map(|f| f.with_court(flat_court())).collect();
        frames[2].court = None;

        let mut driver =
            PipelineDriver::new(frames.into_iter(), FrameCalibration, PipelineConfig::default())
                .unwrap();
        assert!(driver.step().is_ok());
        assert!(driver.step().is_ok());
        let err = driver.step().unwrap_err();
        assert!(matches!(err, PipelineError::CalibrationUnavailable { frame_index: 3 }));
        assert_eq!(driver.state(), PipelineState::Done);
    }

    #[test]
    fn test_per_frame_corners_are_cached() {
        let frames: Vec<RawFrame> =
            sample_rally().into_iter().map(|f| f.with_court(flat_court())).collect();
        let driver =
            PipelineDriver::new(frames.into_iter(), FrameCalibration, PipelineConfig::default())
                .unwrap();
        let output = driver.run().unwrap();
        assert_eq!(output.stats.calibrations_computed, 1);
        assert_eq!(output.timeline.len(), 4);
    }

    #[test]
    fn test_recalibrate_every_frame_gives_same_timeline() {
        let config = PipelineConfig { recalibrate_every_frame: true, ..PipelineConfig::default() };
        let output = process_frames(sample_rally(), flat_court(), config).unwrap();
        assert_eq!(output.stats.calibrations_computed, 11);
        assert_eq!(output.timeline.len(), 4);
    }

    #[test]
    fn test_parallel_detectors_same_timeline() {
        let config = PipelineConfig { parallel_detectors: true, ..PipelineConfig::default() };
        let parallel = process_frames(sample_rally(), flat_court(), config).unwrap();
        let sequential =
            process_frames(sample_rally(), flat_court(), PipelineConfig::default()).unwrap();
        assert_eq!(parallel.timeline, sequential.timeline);
    }

    #[test]
    fn test_window_capacity_bounds_history() {
        let mut config = PipelineConfig::default();
        config.window.fps = 2;
        config.window.seconds = 1.0;

        let mut driver = PipelineDriver::new(
            sample_rally().into_iter(),
            FixedCalibration::new(flat_court()),
            config,
        )
        .unwrap();
        while driver.step().unwrap() == PipelineState::Running {
            assert!(driver.window().len() <= 2);
        }

        // Two frames of history: side crossings only, never bounce or shot
        let output = driver.finish();
        assert_eq!(pairs(&output.timeline), vec![(4, "RightOfNet"), (8, "LeftOfNet")]);
    }

    #[test]
    fn test_cancel_keeps_partial_timeline() {
        let cancel = AtomicBool::new(true);
        let driver = PipelineDriver::new(
            sample_rally().into_iter(),
            FixedCalibration::new(flat_court()),
            PipelineConfig::default(),
        )
        .unwrap();
        let output = driver.run_with_cancel(&cancel).unwrap();
        assert!(output.timeline.is_empty());
        assert_eq!(output.stats.frames_processed, 0);

        let mut driver = PipelineDriver::new(
            sample_rally().into_iter(),
            FixedCalibration::new(flat_court()),
            PipelineConfig::default(),
        )
        .unwrap();
        for _ in 0..6 {
            driver.step().unwrap();
        }
        let partial = driver.finish();
        assert_eq!(pairs(&partial.timeline), vec![(4, "RightOfNet"), (5, "Bounce")]);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = PipelineConfig::default();
        config.detectors.bounce_speed_ratio = 0.0;
        let result = PipelineDriver::new(
            Vec::<RawFrame>::new().into_iter(),
            FixedCalibration::new(flat_court()),
            config,
        );
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_window_rejected_before_allocation() {
        let mut config = PipelineConfig::default();
        config.window.seconds = 1.0e300;
        let result = PipelineDriver::new(
            sample_rally().into_iter(),
            FixedCalibration::new(flat_court()),
            config,
        );
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_stream() {
        let output =
            process_frames(Vec::new(), flat_court(), PipelineConfig::default()).unwrap();
        assert!(output.timeline.is_empty());
        assert_eq!(output.to_json_pretty().unwrap(), "[]");
    }
}
