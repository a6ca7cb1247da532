// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned rectangles in a wall's (U,V) surface frame.
//!
//! U runs along the wall, V is vertical. Rectangles describe both opening
//! footprints and the parametric extent of a face.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rectangle in UV space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectUv {
    pub umin: f64,
    pub umax: f64,
    pub vmin: f64,
    pub vmax: f64,
}

impl RectUv {
    /// Create a rectangle from its extents, rejecting inverted or NaN bounds
    pub fn new(umin: f64, umax: f64, vmin: f64, vmax: f64) -> Result<Self> {
        if !(umin <= umax) || !(vmin <= vmax) {
            return Err(Error::InvalidRect(format!(
                "u [{umin}, {umax}] v [{vmin}, {vmax}]"
            )));
        }
        Ok(Self {
            umin,
            umax,
            vmin,
            vmax,
        })
    }

    /// Rectangle of the given size centered at `(u, v)`.
    /// Negative sizes are clamped to zero.
    pub fn from_center(u: f64, v: f64, width: f64, height: f64) -> Self {
        let hw = width.max(0.0) * 0.5;
        let hh = height.max(0.0) * 0.5;
        Self {
            umin: u - hw,
            umax: u + hw,
            vmin: v - hh,
            vmax: v + hh,
        }
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.umin + self.umax) * 0.5,
            (self.vmin + self.vmax) * 0.5,
        )
    }

    pub fn width(&self) -> f64 {
        self.umax - self.umin
    }

    pub fn height(&self) -> f64 {
        self.vmax - self.vmin
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &RectUv) -> RectUv {
        RectUv {
            umin: self.umin.min(other.umin),
            umax: self.umax.max(other.umax),
            vmin: self.vmin.min(other.vmin),
            vmax: self.vmax.max(other.vmax),
        }
    }

    /// Gap-tolerant overlap: true when, after growing both rectangles by
    /// `gap / 2` on every side, they overlap on both axes. Touching counts.
    pub fn intersects_with_gap(&self, other: &RectUv, gap: f64) -> bool {
        if self.umax + gap < other.umin || other.umax + gap < self.umin {
            return false;
        }
        if self.vmax + gap < other.vmin || other.vmax + gap < self.vmin {
            return false;
        }
        true
    }

    /// Point containment with a symmetric tolerance
    pub fn contains(&self, p: &Point2<f64>, eps: f64) -> bool {
        p.x >= self.umin - eps
            && p.x <= self.umax + eps
            && p.y >= self.vmin - eps
            && p.y <= self.vmax + eps
    }
}
