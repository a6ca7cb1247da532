// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face projection provider.
//!
//! Projecting onto a real (possibly trimmed) face is a CAD-kernel operation.
//! The engine only needs it through [`FaceProjector`], so hosts with a
//! kernel can answer exactly while tests use [`PlanarFaceProjector`].

use opening_lite_geometry::{Point2, Point3};

use crate::document::PlanarFace;

/// Projects source-local points onto a face's parametric space.
pub trait FaceProjector {
    /// Face-UV coordinates of the projection of `point`, or `None` when the
    /// point does not project onto the face.
    fn project(&self, face: &PlanarFace, point: &Point3<f64>) -> Option<Point2<f64>>;
}

/// Orthogonal projection onto the face plane using its parametric axes.
///
/// Treats the face as untrimmed; extent checks are left to the caller's UV
/// bounds test.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarFaceProjector;

impl FaceProjector for PlanarFaceProjector {
    fn project(&self, face: &PlanarFace, point: &Point3<f64>) -> Option<Point2<f64>> {
        let rel = point - face.origin;
        let u = rel.dot(&face.u_axis);
        let v = rel.dot(&face.v_axis);
        if u.is_finite() && v.is_finite() {
            Some(Point2::new(u, v))
        } else {
            None
        }
    }
}
