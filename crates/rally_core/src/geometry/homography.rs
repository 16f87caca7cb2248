//! Planar perspective transform from pixel space to court space.
//!
//! ## Algorithm
//! 1. Reject corner sets where any three corners are (nearly) collinear
//! 2. Condition the pixel corners: centroid to origin, mean distance sqrt(2)
//! 3. Solve the 8x8 direct linear system for the conditioned correspondence
//!    `tl→(0,0)`, `tr→(W,0)`, `br→(W,L)`, `bl→(0,L)` with h22 = 1
//! 4. Fold the conditioning back in: `H = Hn * T`

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use tracing::trace;

use super::{CourtCorners, Point2D};
use crate::config::CourtSpec;
use crate::error::{PipelineError, Result};

/// Twice a corner triangle's area, relative to the squared span of the
/// quad, below which the corners count as collinear.
pub const COLLINEARITY_TOLERANCE: f64 = 1e-4;

/// Homogeneous w below this means the point lies on the vanishing line.
const MIN_HOMOGENEOUS_W: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateNormalizer {
    matrix: Matrix3<f64>,
    court: CourtSpec,
}

impl CoordinateNormalizer {
    /// Solve the transform for one calibration.
    ///
    /// Fails with `InvalidCalibration` for non-finite, coincident or
    /// collinear corners, or when the linear system is singular.
    pub fn new(corners: &CourtCorners, court: CourtSpec) -> Result<Self> {
        let src = corners.as_array();
        check_non_degenerate(&src)?;

        let dst = [
            Point2D::new(0.0, 0.0),
            Point2D::new(court.width_m, 0.0),
            Point2D::new(court.width_m, court.length_m),
            Point2D::new(0.0, court.length_m),
        ];

        let conditioning = conditioning_transform(&src)?;
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            let p = conditioning * Vector3::new(s.x, s.y, 1.0);
            let (x, y) = (p.x, p.y);
            let r = 2 * i;

            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -d.x * x;
            a[(r, 7)] = -d.x * y;
            b[r] = d.x;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -d.y * x;
            a[(r + 1, 7)] = -d.y * y;
            b[r + 1] = d.y;
        }

        let h = a.lu().solve(&b).ok_or_else(|| {
            PipelineError::InvalidCalibration("perspective system is singular".to_string())
        })?;

        #[rustfmt::skip]
        let conditioned = Matrix3::new(
            h[0], h[1], h[2],
            h[3], h[4], h[5],
            h[6], h[7], 1.0,
        );
        let matrix = conditioned * conditioning;

        if !matrix.iter().all(|v| v.is_finite()) || matrix.determinant().abs() < f64::EPSILON {
            return Err(PipelineError::InvalidCalibration(
                "perspective transform is ill-conditioned".to_string(),
            ));
        }

        Ok(Self { matrix, court })
    }

    /// Map a pixel-space point into court meters.
    ///
    /// Points on the camera's vanishing line come back non-finite; use
    /// [`try_normalize`](Self::try_normalize) when that matters.
    pub fn normalize(&self, point: Point2D) -> Point2D {
        let v = self.matrix * Vector3::new(point.x, point.y, 1.0);
        Point2D::new(v.x / v.z, v.y / v.z)
    }

    /// Like [`normalize`](Self::normalize) but `None` for points with no
    /// finite court position.
    pub fn try_normalize(&self, point: Point2D) -> Option<Point2D> {
        if !point.is_finite() {
            return None;
        }
        let v = self.matrix * Vector3::new(point.x, point.y, 1.0);
        if v.z.abs() < MIN_HOMOGENEOUS_W {
            trace!(x = point.x, y = point.y, "point projects onto vanishing line");
            return None;
        }
        let out = Point2D::new(v.x / v.z, v.y / v.z);
        out.is_finite().then_some(out)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn court(&self) -> CourtSpec {
        self.court
    }
}

fn check_non_degenerate(corners: &[Point2D; 4]) -> Result<()> {
    if !corners.iter().all(Point2D::is_finite) {
        return Err(PipelineError::InvalidCalibration("non-finite corner".to_string()));
    }

    let mut span_sq = 0.0f64;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let dx = corners[j].x - corners[i].x;
            let dy = corners[j].y - corners[i].y;
            span_sq = span_sq.max(dx * dx + dy * dy);
        }
    }
    if span_sq <= 0.0 {
        return Err(PipelineError::InvalidCalibration("all corners coincide".to_string()));
    }

    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if cross.abs() <= COLLINEARITY_TOLERANCE * span_sq {
            return Err(PipelineError::InvalidCalibration(format!(
                "corners ({:.1}, {:.1}), ({:.1}, {:.1}), ({:.1}, {:.1}) are collinear",
                a.x, a.y, b.x, b.y, c.x, c.y
            )));
        }
    }

    Ok(())
}

/// Similarity transform moving the centroid to the origin with a mean
/// distance of sqrt(2).
fn conditioning_transform(points: &[Point2D; 4]) -> Result<Matrix3<f64>> {
    let cx = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;

    if mean_dist <= f64::EPSILON {
        return Err(PipelineError::InvalidCalibration("corners have no spread".to_string()));
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    #[rustfmt::skip]
    let t = Matrix3::new(
        s,   0.0, -s * cx,
        0.0, s,   -s * cy,
        0.0, 0.0, 1.0,
    );
    Ok(t)
}
