//! Pipeline Configuration
//!
//! Every tunable used by the pipeline lives here instead of being a literal
//! inside a detector. The detector thresholds are empirical values measured
//! on broadcast footage at 60 fps.
//!
//! ## Usage
//!
//! ```rust
//! use rally_core::config::PipelineConfig;
//!
//! let config = PipelineConfig::default();
//! assert_eq!(config.window.capacity(), 300);
//!
//! let sensitive = PipelineConfig::sensitive();
//! assert!(sensitive.detectors.shot_noise_floor_m < config.detectors.shot_noise_floor_m);
//! ```
//!
//! ## Environment Variables
//!
//! - `RALLY_DETECTOR_PROFILE`: Select preset (sensitive, conservative, default)

use crate::error::{PipelineError, Result};
use crate::geometry::{COURT_LENGTH_M, COURT_WIDTH_M};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Longest window accepted by `validate()`: 30 minutes at 60 fps.
pub const MAX_WINDOW_FRAMES: usize = 108_000;

/// Real-world court rectangle the homography maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtSpec {
    /// Singles sideline to sideline (m)
    pub width_m: f64,
    /// Baseline to baseline (m)
    pub length_m: f64,
}

impl Default for CourtSpec {
    fn default() -> Self {
        Self { width_m: COURT_WIDTH_M, length_m: COURT_LENGTH_M }
    }
}

/// How much history the sliding window retains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub fps: u32,
    pub seconds: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { fps: 60, seconds: 5.0 }
    }
}

impl WindowConfig {
    /// Number of frames retained, never less than one.
    pub fn capacity(&self) -> usize {
        let frames = (self.fps as f64 * self.seconds).round();
        if frames.is_finite() && frames >= 1.0 {
            frames as usize
        } else {
            1
        }
    }
}

/// Detector tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorThresholds {
    /// Court-space x of the net line (m). Court x spans the width
    /// (0 to 8.23), so the default of half the court length sits outside the
    /// right sideline and only a ball tracked past it can cross the net.
    pub net_x_m: f64,
    /// Minimum |v1| for a direction reversal to count as a shot (m/frame)
    pub shot_noise_floor_m: f64,
    /// |v2|/|v1| below this is a bounce
    pub bounce_speed_ratio: f64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            net_x_m: COURT_LENGTH_M / 2.0,
            shot_noise_floor_m: 0.05,
            bounce_speed_ratio: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub court: CourtSpec,
    pub window: WindowConfig,
    pub detectors: DetectorThresholds,
    /// Evaluate the detectors of one tick on the rayon pool
    pub parallel_detectors: bool,
    /// Rebuild the homography on every frame even when corners are unchanged
    pub recalibrate_every_frame: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            court: CourtSpec::default(),
            window: WindowConfig::default(),
            detectors: DetectorThresholds::default(),
            parallel_detectors: false,
            recalibrate_every_frame: false,
        }
    }
}

impl PipelineConfig {
    /// Picks up smaller direction changes and softer bounces.
    pub fn sensitive() -> Self {
        Self {
            detectors: DetectorThresholds {
                shot_noise_floor_m: 0.02,
                bounce_speed_ratio: 0.9,
                ..DetectorThresholds::default()
            },
            ..Self::default()
        }
    }

    /// Fewer false positives on jittery tracking.
    pub fn conservative() -> Self {
        Self {
            detectors: DetectorThresholds {
                shot_noise_floor_m: 0.10,
                bounce_speed_ratio: 0.6,
                ..DetectorThresholds::default()
            },
            ..Self::default()
        }
    }

    pub fn from_env_or_default() -> Self {
        match env::var("RALLY_DETECTOR_PROFILE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "sensitive" => Self::sensitive(),
            "conservative" => Self::conservative(),
            _ => Self::default(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| PipelineError::ConfigParse {
            format: "yaml",
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| PipelineError::ConfigParse {
            format: "json",
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` file, anything else is parsed as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let court = &self.court;
        if !(court.width_m.is_finite() && court.width_m > 0.0)
            || !(court.length_m.is_finite() && court.length_m > 0.0)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "court dimensions must be positive: {} x {}",
                court.width_m, court.length_m
            )));
        }

        if self.window.fps == 0 {
            return Err(PipelineError::InvalidConfig("fps must be at least 1".to_string()));
        }
        if !(self.window.seconds.is_finite() && self.window.seconds > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "window seconds must be positive: {}",
                self.window.seconds
            )));
        }
        let frames = self.window.fps as f64 * self.window.seconds;
        if frames.round() > MAX_WINDOW_FRAMES as f64 {
            return Err(PipelineError::InvalidConfig(format!(
                "window of {} frames exceeds the {} frame maximum",
                frames, MAX_WINDOW_FRAMES
            )));
        }

        let det = &self.detectors;
        if !(det.shot_noise_floor_m.is_finite() && det.shot_noise_floor_m >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "shot noise floor must be non-negative: {}",
                det.shot_noise_floor_m
            )));
        }
        if !(det.bounce_speed_ratio > 0.0 && det.bounce_speed_ratio <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "bounce speed ratio must be in (0, 1]: {}",
                det.bounce_speed_ratio
            )));
        }
        // Court-space x runs across the width, so the default net (half the
        // length) sits beyond the right sideline. Only positivity is checked.
        if !(det.net_x_m.is_finite() && det.net_x_m > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "net position must be positive: {}",
                det.net_x_m
            )));
        }

        Ok(())
    }
}
