// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Infinite planes: signed distances, segment intersection and projection.

use nalgebra::{Point3, Vector3};

/// Denominators below this make a segment parallel to the plane.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Plane defined by a point and a unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Point on the plane
    pub point: Point3<f64>,
    /// Unit normal
    pub normal: Vector3<f64>,
}

/// Intersection of a segment's supporting line with a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Intersection point
    pub point: Point3<f64>,
    /// Line parameter, 0 at the segment start and 1 at its end
    pub t: f64,
}

impl Plane {
    /// Signed distance from point to plane.
    /// Positive = in front (normal side), negative = behind.
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }

    /// Orthogonal projection of `point` onto the plane
    pub fn project_point(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }

    /// Intersects the infinite line through `start` and `end` with the plane.
    ///
    /// Returns `None` when the line is parallel to the plane. The returned
    /// parameter is not clamped; callers decide how far outside `[0, 1]`
    /// they accept.
    pub fn intersect_line(&self, start: &Point3<f64>, end: &Point3<f64>) -> Option<SegmentHit> {
        let v = end - start;
        let denom = v.dot(&self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (self.point - start).dot(&self.normal) / denom;
        Some(SegmentHit {
            point: start + v * t,
            t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn yz_plane() -> Plane {
        Plane {
            point: Point3::origin(),
            normal: Vector3::x(),
        }
    }

    #[test]
    fn signed_distance_sides() {
        let plane = yz_plane();
        assert_relative_eq!(plane.signed_distance(&Point3::new(1.5, 3.0, 0.0)), 1.5);
        assert_relative_eq!(plane.signed_distance(&Point3::new(-0.5, 0.0, 9.0)), -0.5);
    }

    #[test]
    fn projection_lands_on_plane() {
        let plane = yz_plane();
        let p = plane.project_point(&Point3::new(4.0, 1.0, 2.0));
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 1.0);
        assert_relative_eq!(p.z, 2.0);
    }

    #[test]
    fn line_intersection_parameter() {
        let plane = yz_plane();
        let hit = plane
            .intersect_line(&Point3::new(-1.0, 0.0, 0.0), &Point3::new(3.0, 4.0, 0.0))
            .unwrap();
        assert_relative_eq!(hit.t, 0.25);
        assert_relative_eq!(hit.point.x, 0.0);
        assert_relative_eq!(hit.point.y, 1.0);
    }

    #[test]
    fn parallel_line_has_no_hit() {
        let plane = yz_plane();
        assert!(plane
            .intersect_line(&Point3::new(1.0, 0.0, 0.0), &Point3::new(1.0, 5.0, 0.0))
            .is_none());
    }
}
