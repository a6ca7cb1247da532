// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-invocation configuration and fixed engine tolerances.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Millimetres to metres.
#[inline]
pub fn mm(value: f64) -> f64 {
    value / 1000.0
}

/// Metres to millimetres.
#[inline]
pub fn to_mm(value: f64) -> f64 {
    value * 1000.0
}

/// Required clearance beyond each wall face for a crossing to count.
pub const CROSSING_TOLERANCE: f64 = 0.005;

/// How far outside `[0, 1]` a segment intersection parameter may fall.
pub const SEGMENT_PARAM_SLACK: f64 = 0.01;

/// Slack when testing a projected point against face UV bounds.
pub const FACE_UV_EPSILON: f64 = 1e-6;

/// Runs with `|D·N|` below this graze the wall and are ignored.
pub const GRAZING_COSINE: f64 = 1e-3;

/// A required dimension must exceed the existing one by more than this to
/// count as undersized.
pub const RESIZE_THRESHOLD: f64 = 0.001;

/// Openings closer than this to their target are not moved.
pub const MOVE_THRESHOLD: f64 = 1e-6;

/// Local face normals with `|z|` below this are wall side faces.
pub const SIDE_FACE_MAX_VERTICAL: f64 = 0.3;

/// Wall thickness used when the wall does not report one.
pub const FALLBACK_WALL_THICKNESS: f64 = 0.200;

/// Cable tray size used when the run does not report one.
pub const FALLBACK_TRAY_WIDTH: f64 = 0.200;
pub const FALLBACK_TRAY_HEIGHT: f64 = 0.100;

/// Conduit diameter used when the run does not report one.
pub const FALLBACK_CONDUIT_DIAMETER: f64 = 0.025;

/// Tunable parameters of a reconciliation run. All values in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Added to each cross-section dimension of a run (both sides together).
    pub clearance: f64,
    /// Footprints closer than this are merged into one opening.
    pub cluster_gap: f64,
    /// Maximum center distance for matching an existing opening.
    pub search_tolerance: f64,
    /// Growth of the wall/run bounding-box pre-filter.
    pub bbox_tolerance: f64,
    /// Added to the wall thickness to get the opening depth.
    pub depth_margin: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clearance: mm(100.0),
            cluster_gap: mm(300.0),
            search_tolerance: mm(200.0),
            bbox_tolerance: mm(300.0),
            depth_margin: mm(50.0),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables (millimetres),
    /// falling back to the defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            clearance: env_mm("OPENING_CLEARANCE_MM").unwrap_or(defaults.clearance),
            cluster_gap: env_mm("OPENING_CLUSTER_GAP_MM").unwrap_or(defaults.cluster_gap),
            search_tolerance: env_mm("OPENING_SEARCH_TOL_MM")
                .unwrap_or(defaults.search_tolerance),
            bbox_tolerance: env_mm("OPENING_BBOX_TOL_MM").unwrap_or(defaults.bbox_tolerance),
            depth_margin: env_mm("OPENING_DEPTH_MARGIN_MM").unwrap_or(defaults.depth_margin),
        }
    }

    /// Rejects negative or non-finite values.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("clearance", self.clearance),
            ("cluster_gap", self.cluster_gap),
            ("search_tolerance", self.search_tolerance),
            ("bbox_tolerance", self.bbox_tolerance),
            ("depth_margin", self.depth_margin),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig { field, value });
            }
        }
        Ok(())
    }
}

fn env_mm(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().replace(',', ".").parse::<f64>().ok())
        .map(mm)
}
