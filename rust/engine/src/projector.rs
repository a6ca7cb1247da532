// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Penetration projector.
//!
//! For each MEP run and each nearby wall frame, decides whether the run
//! truly passes through the wall and, if so, computes the footprint the
//! opening needs in the wall's UV space.
//!
//! A run only penetrates a wall when its two endpoints lie on strictly
//! opposite sides of the wall, each clear of the faces by
//! [`CROSSING_TOLERANCE`]. Runs ending inside the wall or running along it
//! do not produce requests.

use std::collections::BTreeMap;

use opening_lite_geometry::{try_normalize, Aabb3, Point3, RectUv, Vector3};
use smallvec::SmallVec;

use crate::cancel::CancelToken;
use crate::classify::{required_section, RunClassifier, RunKind};
use crate::config::{
    EngineConfig, CROSSING_TOLERANCE, FACE_UV_EPSILON, GRAZING_COSINE, SEGMENT_PARAM_SLACK,
};
use crate::document::{ElementId, MepRun, RunGeometry, WallKey};
use crate::error::Result;
use crate::face::FaceProjector;
use crate::wall_frame::WallFrame;

/// Ids of the runs behind a footprint, sorted and unique.
pub type RunIds = SmallVec<[ElementId; 4]>;

/// Footprint one run needs on one wall.
#[derive(Debug, Clone, PartialEq)]
pub struct PenetrationRequest {
    pub wall: WallKey,
    pub rect: RectUv,
    pub runs: RunIds,
}

/// A run reduced to what the crossing test needs.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub id: ElementId,
    pub kind: RunKind,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    /// Unit direction from `start` to `end`.
    pub direction: Vector3<f64>,
    /// Required clear width and height, clearance included.
    pub width: f64,
    pub height: f64,
    pub bounds: Aabb3,
}

impl PreparedRun {
    /// Classifies and sizes a run. `None` for unsupported kinds, runs
    /// without a straight centre line and zero-length runs.
    pub fn new(run: &MepRun, classifier: &dyn RunClassifier, clearance: f64) -> Option<Self> {
        let RunGeometry::Line { start, end } = run.geometry else {
            return None;
        };
        let kind = classifier.classify(run);
        let (width, height) = required_section(kind, run, clearance)?;
        let direction = try_normalize(&(end - start))?;
        let bounds = Aabb3::new(start, end).expanded(width.max(height) * 0.5);

        Some(Self {
            id: run.id,
            kind,
            start,
            end,
            direction,
            width,
            height,
            bounds,
        })
    }
}

/// Extra opening size caused by a run crossing the wall at an angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewEnlargement {
    pub along_u: f64,
    pub along_v: f64,
}

/// Enlargement for a run with unit `direction` through a wall of the given
/// frame. `None` when the run grazes the wall (`|D·N|` below
/// [`GRAZING_COSINE`]).
pub fn skew_enlargement(direction: &Vector3<f64>, frame: &WallFrame) -> Option<SkewEnlargement> {
    let c = direction.dot(&frame.n).abs();
    if c < GRAZING_COSINE {
        return None;
    }
    Some(SkewEnlargement {
        along_u: frame.thickness * direction.dot(&frame.u).abs() / c,
        along_v: frame.thickness * direction.dot(&frame.v).abs() / c,
    })
}

/// Tests one run against one wall and returns its footprint on a true
/// crossing.
pub fn project_run(
    run: &PreparedRun,
    frame: &WallFrame,
    faces: &dyn FaceProjector,
    bbox_tolerance: f64,
) -> Option<PenetrationRequest> {
    if !run.bounds.intersects(&frame.bounds, bbox_tolerance) {
        return None;
    }

    let plane = frame.mid_plane();
    let limit = frame.thickness * 0.5 + CROSSING_TOLERANCE;
    let d0 = plane.signed_distance(&run.start);
    let d1 = plane.signed_distance(&run.end);
    let crosses = (d0 > limit && d1 < -limit) || (d1 > limit && d0 < -limit);
    if !crosses {
        return None;
    }

    let hit = plane.intersect_line(&run.start, &run.end)?;
    if hit.t < -SEGMENT_PARAM_SLACK || hit.t > 1.0 + SEGMENT_PARAM_SLACK {
        return None;
    }

    // The hit must land on the face itself, not just on its plane
    let local = frame.to_source(&hit.point);
    let face_uv = faces.project(&frame.face.local, &local)?;
    if !frame.face.local.uv_bounds.contains(&face_uv, FACE_UV_EPSILON) {
        tracing::trace!(run = %run.id, wall = %frame.key, "Crossing outside face extent");
        return None;
    }

    let skew = skew_enlargement(&run.direction, frame)?;
    let uv = frame.to_uv(&hit.point);
    let rect = RectUv::from_center(
        uv.x,
        uv.y,
        run.width + skew.along_u,
        run.height + skew.along_v,
    );

    Some(PenetrationRequest {
        wall: frame.key,
        rect,
        runs: SmallVec::from_slice(&[run.id]),
    })
}

/// Requests per wall, plus run counters for the report.
#[derive(Debug, Default)]
pub struct PenetrationSet {
    pub by_wall: BTreeMap<WallKey, Vec<PenetrationRequest>>,
    pub runs_analysed: usize,
    pub runs_skipped: usize,
}

impl PenetrationSet {
    pub fn request_count(&self) -> usize {
        self.by_wall.values().map(Vec::len).sum()
    }
}

/// Tests every run against every wall frame.
///
/// Cancellation is checked before each run; a cancelled computation returns
/// `Error::Cancelled` and its partial results are dropped.
pub fn compute_penetrations(
    runs: &[MepRun],
    frames: &[WallFrame],
    classifier: &dyn RunClassifier,
    faces: &dyn FaceProjector,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> Result<PenetrationSet> {
    let mut set = PenetrationSet::default();

    for run in runs {
        cancel.check()?;

        let Some(prepared) = PreparedRun::new(run, classifier, config.clearance) else {
            tracing::debug!(
                run = %run.id,
                category = %run.category,
                "Run skipped: no straight supported geometry"
            );
            set.runs_skipped += 1;
            continue;
        };
        set.runs_analysed += 1;

        for frame in frames {
            if let Some(request) = project_run(&prepared, frame, faces, config.bbox_tolerance) {
                set.by_wall.entry(frame.key).or_default().push(request);
            }
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CategoryClassifier;
    use crate::document::{LinkedSource, SourceId};
    use crate::face::PlanarFaceProjector;
    use crate::synthetic::{cable_tray, conduit, straight_wall};
    use crate::wall_frame::build_wall_frames;
    use approx::assert_relative_eq;
    use opening_lite_geometry::Transform3;

    /// Wall along X from (0,0,0) to (10,0,0), 0.2 thick, 3 high.
    fn frame() -> WallFrame {
        let wall = straight_wall(
            ElementId(100),
            Point3::origin(),
            Point3::new(10.0, 0.0, 0.0),
            0.2,
            3.0,
        );
        let source = LinkedSource {
            id: SourceId(1),
            name: "ARC".into(),
            transform: Transform3::identity(),
            walls: vec![wall],
        };
        build_wall_frames(&[source]).remove(0)
    }

    fn prepare(run: &MepRun, clearance: f64) -> PreparedRun {
        PreparedRun::new(run, &CategoryClassifier::default(), clearance).unwrap()
    }

    #[test]
    fn perpendicular_conduit_footprint() {
        let f = frame();
        let run = conduit(
            ElementId(1),
            Point3::new(4.0, -2.0, 1.5),
            Point3::new(4.0, 2.0, 1.5),
            0.1,
        );
        let req = project_run(&prepare(&run, 0.1), &f, &PlanarFaceProjector, 0.3).unwrap();

        assert_relative_eq!(req.rect.width(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(req.rect.height(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(req.rect.center().x, 4.0, epsilon = 1e-12);
        assert_relative_eq!(req.rect.center().y, 1.5, epsilon = 1e-12);
        assert_eq!(req.runs.as_slice(), &[ElementId(1)]);
    }

    #[test]
    fn perpendicular_run_has_no_skew() {
        let f = frame();
        let skew = skew_enlargement(&f.n, &f).unwrap();
        assert_relative_eq!(skew.along_u, 0.0);
        assert_relative_eq!(skew.along_v, 0.0);
    }

    #[test]
    fn forty_five_degree_run_grows_by_thickness() {
        let f = frame();
        let d = (f.u + f.n).normalize();
        let skew = skew_enlargement(&d, &f).unwrap();
        assert_relative_eq!(skew.along_u, f.thickness, epsilon = 1e-12);
        assert_relative_eq!(skew.along_v, 0.0, epsilon = 1e-12);

        let run = conduit(
            ElementId(2),
            Point3::new(3.0, -1.0, 1.0),
            Point3::new(5.0, 1.0, 1.0),
            0.1,
        );
        let req = project_run(&prepare(&run, 0.0), &f, &PlanarFaceProjector, 0.3).unwrap();
        assert_relative_eq!(req.rect.width(), 0.1 + 0.2, epsilon = 1e-9);
        assert_relative_eq!(req.rect.height(), 0.1, epsilon = 1e-9);
        assert_relative_eq!(req.rect.center().x, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn sloped_run_grows_vertically() {
        let f = frame();
        let run = cable_tray(
            ElementId(3),
            Point3::new(4.0, -1.0, 0.5),
            Point3::new(4.0, 1.0, 2.5),
            0.3,
            0.1,
        );
        let req = project_run(&prepare(&run, 0.0), &f, &PlanarFaceProjector, 0.3).unwrap();
        assert_relative_eq!(req.rect.width(), 0.3, epsilon = 1e-9);
        assert_relative_eq!(req.rect.height(), 0.1 + 0.2, epsilon = 1e-9);
        assert_relative_eq!(req.rect.center().y, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn run_ending_inside_wall_is_not_a_crossing() {
        let f = frame();
        let run = conduit(
            ElementId(4),
            Point3::new(4.0, -2.0, 1.5),
            Point3::new(4.0, 0.05, 1.5),
            0.1,
        );
        assert!(project_run(&prepare(&run, 0.1), &f, &PlanarFaceProjector, 0.3).is_none());
    }

    #[test]
    fn run_parallel_to_wall_is_not_a_crossing() {
        let f = frame();
        let run = conduit(
            ElementId(5),
            Point3::new(1.0, 0.3, 1.5),
            Point3::new(9.0, 0.3, 1.5),
            0.1,
        );
        assert!(project_run(&prepare(&run, 0.1), &f, &PlanarFaceProjector, 0.3).is_none());
    }

    #[test]
    fn crossing_beyond_wall_end_is_rejected() {
        let f = frame();
        // Crosses the infinite mid-plane at u = 10.2, past the wall end,
        // but still within the bounding-box tolerance
        let run = conduit(
            ElementId(6),
            Point3::new(10.2, -1.0, 1.5),
            Point3::new(10.2, 1.0, 1.5),
            0.1,
        );
        assert!(project_run(&prepare(&run, 0.0), &f, &PlanarFaceProjector, 0.5).is_none());
    }

    #[test]
    fn crossing_above_wall_top_is_rejected() {
        let f = frame();
        let run = conduit(
            ElementId(7),
            Point3::new(4.0, -1.0, 3.1),
            Point3::new(4.0, 1.0, 3.1),
            0.05,
        );
        assert!(project_run(&prepare(&run, 0.0), &f, &PlanarFaceProjector, 0.5).is_none());
    }

    #[test]
    fn far_away_run_fails_prefilter() {
        let f = frame();
        let run = conduit(
            ElementId(8),
            Point3::new(4.0, -2.0, 20.0),
            Point3::new(4.0, 2.0, 20.0),
            0.1,
        );
        assert!(project_run(&prepare(&run, 0.1), &f, &PlanarFaceProjector, 0.3).is_none());
    }

    #[test]
    fn unsupported_and_curved_runs_are_skipped() {
        let f = frame();
        let mut duct = conduit(
            ElementId(9),
            Point3::new(4.0, -2.0, 1.5),
            Point3::new(4.0, 2.0, 1.5),
            0.1,
        );
        duct.category = "Ducts".into();
        let mut bend = duct.clone();
        bend.id = ElementId(10);
        bend.category = "Conduits".into();
        bend.geometry = RunGeometry::Curve;

        let set = compute_penetrations(
            &[duct, bend],
            &[f],
            &CategoryClassifier::default(),
            &PlanarFaceProjector,
            &EngineConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(set.runs_skipped, 2);
        assert_eq!(set.runs_analysed, 0);
        assert_eq!(set.request_count(), 0);
    }

    #[test]
    fn cancelled_computation_returns_error() {
        let f = frame();
        let run = conduit(
            ElementId(1),
            Point3::new(4.0, -2.0, 1.5),
            Point3::new(4.0, 2.0, 1.5),
            0.1,
        );
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = compute_penetrations(
            &[run],
            &[f],
            &CategoryClassifier::default(),
            &PlanarFaceProjector,
            &EngineConfig::default(),
            &cancel,
        );
        assert!(matches!(result, Err(crate::error::Error::Cancelled)));
    }
}
