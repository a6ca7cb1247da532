// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall frame builder.
//!
//! Turns every wall of every linked source into a host-space [`WallFrame`]:
//! an orthonormal (U, V, N) frame, the wall thickness, a host-space bounding
//! box and the planar side face new openings are hosted on.
//!
//! Walls that cannot be framed (no location curve, degenerate direction,
//! no bounding box, no side face) are skipped with a debug message. They
//! simply cannot receive an opening in this run.

use opening_lite_geometry::{
    try_normalize, world_up, Aabb3, Plane, Point2, Point3, RectUv, Transform3, Vector3,
};

use crate::config::{FALLBACK_WALL_THICKNESS, SIDE_FACE_MAX_VERTICAL};
use crate::document::{HostFaceRef, LinkedSource, PlanarFace, SourceWall, WallKey, WallLocation};

/// The face of a wall that openings are placed on.
#[derive(Debug, Clone)]
pub struct RepresentativeFace {
    /// The face as stored in the linked source (source-local coordinates).
    pub local: PlanarFace,
    /// Handle for hosting a new opening on this face.
    pub host_ref: HostFaceRef,
    /// Face origin in host space.
    pub origin: Point3<f64>,
    /// Unit face normal in host space.
    pub normal: Vector3<f64>,
}

/// Host-space frame of one linked wall.
///
/// `u` runs along the wall, `v` is world up and `n` is the wall normal,
/// oriented like the representative face. The three are orthonormal.
#[derive(Debug, Clone)]
pub struct WallFrame {
    pub key: WallKey,
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub n: Vector3<f64>,
    pub thickness: f64,
    pub bounds: Aabb3,
    pub face: RepresentativeFace,
    /// Host space back to the wall's source space.
    to_source: Transform3,
}

impl WallFrame {
    /// Plane through the frame origin with normal `n`.
    pub fn mid_plane(&self) -> Plane {
        Plane {
            point: self.origin,
            normal: self.n,
        }
    }

    /// Plane of the representative face in host space.
    pub fn face_plane(&self) -> Plane {
        Plane {
            point: self.face.origin,
            normal: self.face.normal,
        }
    }

    /// Wall UV coordinates of a host-space point.
    pub fn to_uv(&self, p: &Point3<f64>) -> Point2<f64> {
        let rel = p - self.origin;
        Point2::new(rel.dot(&self.u), rel.dot(&self.v))
    }

    /// Host-space point on the frame's mid-plane at wall UV `uv`.
    pub fn from_uv(&self, uv: &Point2<f64>) -> Point3<f64> {
        self.origin + self.u * uv.x + self.v * uv.y
    }

    /// Host-space point at wall UV `uv`, projected onto the representative
    /// face. This is where an opening for `uv` is placed.
    pub fn placement_point(&self, uv: &Point2<f64>) -> Point3<f64> {
        self.face_plane().project_point(&self.from_uv(uv))
    }

    /// Converts a host-space point into the wall's source space.
    pub fn to_source(&self, p: &Point3<f64>) -> Point3<f64> {
        self.to_source.transform_point(p)
    }
}

/// Builds frames for every usable wall of every source.
pub fn build_wall_frames(sources: &[LinkedSource]) -> Vec<WallFrame> {
    let mut frames = Vec::new();

    for source in sources {
        let to_source = match source.transform.inverse() {
            Ok(inv) => inv,
            Err(err) => {
                tracing::warn!(
                    source = %source.id,
                    %err,
                    "Skipping linked source with singular transform"
                );
                continue;
            }
        };

        let before = frames.len();
        for wall in &source.walls {
            match build_wall_frame(source, &to_source, wall) {
                Some(frame) => frames.push(frame),
                None => tracing::debug!(
                    source = %source.id,
                    wall = %wall.id,
                    "Wall skipped: no usable frame"
                ),
            }
        }

        tracing::debug!(
            source = %source.id,
            name = %source.name,
            walls = source.walls.len(),
            framed = frames.len() - before,
            "Linked source framed"
        );
    }

    frames
}

/// Builds the frame of one wall, or `None` when the wall cannot host openings.
pub fn build_wall_frame(
    source: &LinkedSource,
    to_source: &Transform3,
    wall: &SourceWall,
) -> Option<WallFrame> {
    let trf = &source.transform;

    let (start, end) = match wall.location? {
        WallLocation::Curve { start, end } => (start, end),
        WallLocation::Point { .. } => return None,
    };

    let up = world_up();
    let tangent = try_normalize(&trf.transform_vector(&(end - start)))?;
    // Keep U horizontal so (U, V, N) stays orthonormal for sloped location lines
    let u = try_normalize(&(tangent - up * tangent.dot(&up)))?;
    let n = try_normalize(&u.cross(&up)).or_else(|| try_normalize(&up.cross(&u)))?;

    let bounds = wall.bounds?.transformed(trf);

    let thickness = wall
        .thickness
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(FALLBACK_WALL_THICKNESS);

    let face = pick_representative_face(source, wall, &n)?;

    // Orient N like the chosen face
    let n = if face.normal.dot(&n) < 0.0 { -n } else { n };

    Some(WallFrame {
        key: WallKey::new(source.id, wall.id),
        origin: trf.transform_point(&start),
        u,
        v: up,
        n,
        thickness,
        bounds,
        face,
        to_source: *to_source,
    })
}

/// Near-vertical planar face whose host normal best aligns with `n`.
fn pick_representative_face(
    source: &LinkedSource,
    wall: &SourceWall,
    n: &Vector3<f64>,
) -> Option<RepresentativeFace> {
    let trf = &source.transform;
    let mut best: Option<(f64, &PlanarFace, Vector3<f64>)> = None;

    for face in &wall.faces {
        let Some(local_normal) = try_normalize(&face.normal) else {
            continue;
        };
        let b = &face.uv_bounds;
        if let Err(err) = RectUv::new(b.umin, b.umax, b.vmin, b.vmax) {
            tracing::debug!(wall = %wall.id, face = %face.reference, %err, "Face ignored");
            continue;
        }
        if local_normal.z.abs() >= SIDE_FACE_MAX_VERTICAL {
            continue;
        }
        let Some(host_normal) = try_normalize(&trf.transform_vector(&local_normal)) else {
            continue;
        };
        let alignment = host_normal.dot(n).abs();
        if best.map_or(true, |(score, _, _)| alignment > score) {
            best = Some((alignment, face, host_normal));
        }
    }

    let (_, face, normal) = best?;
    Some(RepresentativeFace {
        local: face.clone(),
        host_ref: HostFaceRef {
            source: source.id,
            face: face.reference.clone(),
        },
        origin: trf.transform_point(&face.origin),
        normal,
    })
}
