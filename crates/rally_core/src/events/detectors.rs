//! # Event Detectors
//!
//! Stateless analyzers over the tail of the sliding window. Each one looks
//! at the last few frames and optionally reports one event per tick.
//!
//! ## Algorithms
//! - `SideTester`: edge-triggered net crossing over the last 2 frames
//! - `BounceOrShotTester`: horizontal velocity analysis over the last 3
//!   frames; a direction reversal is a shot, a sharp slowdown a bounce
//!
//! Not enough frames, or a frame without a ball, is never an error: the
//! detector just stays silent for that tick.

use rayon::prelude::*;

use super::Event;
use crate::config::DetectorThresholds;
use crate::frame::SlidingWindowBuffer;

/// Shared capability of every detector in the registry.
pub trait EventDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Frames of history needed for a verdict.
    fn required_frames(&self) -> usize;

    /// Same window in, same verdict out.
    fn detect(&self, window: &SlidingWindowBuffer) -> Option<Event>;
}

/// Ball x for each of the last `N` frames, oldest first. `None` when the
/// window is shorter than `N` or any of those frames lost the ball.
fn last_ball_xs<const N: usize>(window: &SlidingWindowBuffer) -> Option<[f64; N]> {
    let recent = window.take_last(N);
    if recent.len() < N {
        return None;
    }
    let mut xs = [0.0; N];
    for (slot, frame) in xs.iter_mut().zip(recent) {
        *slot = frame.ball_x()?;
    }
    Some(xs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourtSide {
    Left,
    Right,
}

/// Fires on the tick the ball crosses the net into `target`.
#[derive(Debug, Clone)]
pub struct SideTester {
    target: CourtSide,
    net_x_m: f64,
}

impl SideTester {
    pub fn new(target: CourtSide, net_x_m: f64) -> Self {
        Self { target, net_x_m }
    }

    pub fn left_of_net(net_x_m: f64) -> Self {
        Self::new(CourtSide::Left, net_x_m)
    }

    pub fn right_of_net(net_x_m: f64) -> Self {
        Self::new(CourtSide::Right, net_x_m)
    }

    fn event(&self) -> Event {
        match self.target {
            CourtSide::Left => Event::LeftOfNet,
            CourtSide::Right => Event::RightOfNet,
        }
    }
}

impl EventDetector for SideTester {
    fn name(&self) -> &'static str {
        match self.target {
            CourtSide::Left => "left_of_net",
            CourtSide::Right => "right_of_net",
        }
    }

    fn required_frames(&self) -> usize {
        2
    }

    fn detect(&self, window: &SlidingWindowBuffer) -> Option<Event> {
        let [prev_x, curr_x] = last_ball_xs::<2>(window)?;
        let prev_is_right = prev_x > self.net_x_m;
        let curr_is_right = curr_x > self.net_x_m;

        let entered = match self.target {
            CourtSide::Right => !prev_is_right && curr_is_right,
            CourtSide::Left => prev_is_right && !curr_is_right,
        };
        entered.then(|| self.event())
    }
}

/// Classifies the ball's horizontal motion over three frames.
#[derive(Debug, Clone)]
pub struct BounceOrShotTester {
    shot_noise_floor_m: f64,
    bounce_speed_ratio: f64,
}

impl BounceOrShotTester {
    pub fn new(shot_noise_floor_m: f64, bounce_speed_ratio: f64) -> Self {
        Self { shot_noise_floor_m, bounce_speed_ratio }
    }

    /// Shot wins over bounce when both could apply.
    pub fn classify(&self, x0: f64, x1: f64, x2: f64) -> Option<Event> {
        let v1 = x1 - x0;
        let v2 = x2 - x1;

        // Zero displacement counts as "not moving right".
        let reversed = (v1 > 0.0) != (v2 > 0.0);
        if reversed && v1.abs() > self.shot_noise_floor_m {
            return Some(Event::Shot);
        }

        if v1 != 0.0 && v2.abs() / v1.abs() < self.bounce_speed_ratio {
            return Some(Event::Bounce);
        }

        None
    }
}

impl Default for BounceOrShotTester {
    fn default() -> Self {
        let thresholds = DetectorThresholds::default();
        Self::new(thresholds.shot_noise_floor_m, thresholds.bounce_speed_ratio)
    }
}

impl EventDetector for BounceOrShotTester {
    fn name(&self) -> &'static str {
        "bounce_or_shot"
    }

    fn required_frames(&self) -> usize {
        3
    }

    fn detect(&self, window: &SlidingWindowBuffer) -> Option<Event> {
        let [x0, x1, x2] = last_ball_xs::<3>(window)?;
        self.classify(x0, x1, x2)
    }
}

/// Fixed, ordered list of detectors run on every tick.
pub struct DetectorSet {
    detectors: Vec<Box<dyn EventDetector>>,
}

impl DetectorSet {
    pub fn new(detectors: Vec<Box<dyn EventDetector>>) -> Self {
        Self { detectors }
    }

    /// Left-of-net, right-of-net, then bounce/shot.
    pub fn standard(thresholds: &DetectorThresholds) -> Self {
        Self::new(vec![
            Box::new(SideTester::left_of_net(thresholds.net_x_m)),
            Box::new(SideTester::right_of_net(thresholds.net_x_m)),
            Box::new(BounceOrShotTester::new(
                thresholds.shot_noise_floor_m,
                thresholds.bounce_speed_ratio,
            )),
        ])
    }

    /// Run every detector against the same window. Results come back in
    /// registry order whether or not they were evaluated in parallel.
    pub fn evaluate(&self, window: &SlidingWindowBuffer, parallel: bool) -> Vec<Event> {
        if parallel {
            self.detectors.par_iter().filter_map(|d| d.detect(window)).collect()
        } else {
            self.detectors.iter().filter_map(|d| d.detect(window)).collect()
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl std::fmt::Debug for DetectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorSet").field("detectors", &self.names()).finish()
    }
}
