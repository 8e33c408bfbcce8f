// ============================================================
// Layer 3 - Hand Landmarks
// ============================================================
// Converts the 21 pixel-space landmarks of a detected hand into
// the feature vector the classifier is trained on.
//
// Normalisation (applied in order):
//   1. Translate every point so the wrist (landmark 0) is (0, 0)
//   2. Flatten to [x0, y0, x1, y1, ...]
//   3. Divide by the largest absolute coordinate
//
// After this the vector is invariant to where the hand sits in
// the frame and to how large it appears, and lies in [-1, 1].

use anyhow::{bail, Result};

use crate::domain::sample::{FEATURE_DIM, NUM_LANDMARKS};

/// Index of the wrist landmark, used as the origin
pub const WRIST: usize = 0;

/// A single (x, y) landmark coordinate on a detected hand
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The full set of landmarks for one hand.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; NUM_LANDMARKS],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Build from a flat `[x0, y0, ..., x20, y20]` slice.
    pub fn from_flat(values: &[f32]) -> Result<Self> {
        if values.len() != FEATURE_DIM {
            bail!(
                "expected {} landmark coordinates ({} points), got {}",
                FEATURE_DIM,
                NUM_LANDMARKS,
                values.len()
            );
        }

        let mut points = [Landmark::default(); NUM_LANDMARKS];
        for (point, xy) in points.iter_mut().zip(values.chunks_exact(2)) {
            *point = Landmark::new(xy[0], xy[1]);
        }
        Ok(Self { points })
    }

    /// Wrist-relative, max-abs-scaled feature vector.
    /// A hand collapsed onto a single point yields all zeros.
    pub fn normalize(&self) -> [f32; FEATURE_DIM] {
        let base = self.points[WRIST];

        let mut features = [0.0f32; FEATURE_DIM];
        for (i, p) in self.points.iter().enumerate() {
            features[2 * i]     = p.x - base.x;
            features[2 * i + 1] = p.y - base.y;
        }

        let max_value = features.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        if max_value > 0.0 {
            for v in features.iter_mut() {
                *v /= max_value;
            }
        }

        features
    }
}
