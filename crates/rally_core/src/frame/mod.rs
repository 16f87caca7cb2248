//! # Tracked Frames
//!
//! Per-frame entity positions, as delivered by the tracker (`RawFrame`, pixel
//! space) and after perspective correction (`NormalizedFrame`, court meters).
//!
//! A frame without a ball, or without players, is an ordinary frame: the
//! tracker simply lost the object for that instant.

pub mod window;

pub use window::SlidingWindowBuffer;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::{CoordinateNormalizer, CourtCorners, Point2D};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Tracker identity, stable across frames
    pub id: u32,
    pub position: Point2D,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub position: Point2D,
}

/// One frame of tracker output in pixel space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFrame {
    pub index: u64,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub ball: Option<Ball>,
    /// Court corners detected in this frame, when the tracker ships them
    #[serde(default)]
    pub court: Option<CourtCorners>,
}

impl RawFrame {
    pub fn new(index: u64) -> Self {
        Self { index, ..Self::default() }
    }

    pub fn with_ball(mut self, x: f64, y: f64) -> Self {
        self.ball = Some(Ball { position: Point2D::new(x, y) });
        self
    }

    pub fn with_player(mut self, id: u32, x: f64, y: f64) -> Self {
        self.players.push(Player { id, position: Point2D::new(x, y) });
        self
    }

    pub fn with_court(mut self, court: CourtCorners) -> Self {
        self.court = Some(court);
        self
    }

    /// Map every entity into court space.
    ///
    /// Entities with no finite court position (on or beyond the vanishing
    /// line) are dropped, the same as if the tracker had missed them.
    pub fn normalize(&self, normalizer: &CoordinateNormalizer) -> NormalizedFrame {
        let ball = self.ball.and_then(|ball| match normalizer.try_normalize(ball.position) {
            Some(position) => Some(Ball { position }),
            None => {
                trace!(frame = self.index, "ball dropped: no finite court position");
                None
            }
        });

        let players = self
            .players
            .iter()
            .filter_map(|player| match normalizer.try_normalize(player.position) {
                Some(position) => Some(Player { id: player.id, position }),
                None => {
                    trace!(frame = self.index, player = player.id, "player dropped: no finite court position");
                    None
                }
            })
            .collect();

        let court = self.court.and_then(|corners| corners.try_map(|p| normalizer.try_normalize(p)));

        NormalizedFrame { index: self.index, players, ball, court }
    }
}

/// One frame with every position in court meters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedFrame {
    pub index: u64,
    pub players: Vec<Player>,
    pub ball: Option<Ball>,
    /// Court corners in court space
    pub court: Option<CourtCorners>,
}

impl NormalizedFrame {
    /// Ball position along the x axis (m), if the ball was seen.
    #[inline]
    pub fn ball_x(&self) -> Option<f64> {
        self.ball.map(|b| b.position.x)
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}
