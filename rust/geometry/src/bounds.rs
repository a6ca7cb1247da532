// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned 3D bounding boxes used for the wall/run pre-filter.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::transform::Transform3;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb3 {
    /// Box spanning two corners given in any order
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Smallest box containing all points, `None` for an empty iterator
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    /// The 8 corners of the box
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let (mn, mx) = (self.min, self.max);
        [
            Point3::new(mn.x, mn.y, mn.z),
            Point3::new(mn.x, mn.y, mx.z),
            Point3::new(mn.x, mx.y, mn.z),
            Point3::new(mn.x, mx.y, mx.z),
            Point3::new(mx.x, mn.y, mn.z),
            Point3::new(mx.x, mn.y, mx.z),
            Point3::new(mx.x, mx.y, mn.z),
            Point3::new(mx.x, mx.y, mx.z),
        ]
    }

    /// Axis-aligned bounds of this box after transforming its 8 corners
    pub fn transformed(&self, transform: &Transform3) -> Self {
        let corners = self.corners().map(|c| transform.transform_point(&c));
        // 8 corners, never empty
        let mut bounds = Self {
            min: corners[0],
            max: corners[0],
        };
        for c in &corners[1..] {
            bounds.min = bounds.min.inf(c);
            bounds.max = bounds.max.sup(c);
        }
        bounds
    }

    /// Box grown by `margin` on every side
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Overlap test where the boxes may be up to `tolerance` apart on each axis
    pub fn intersects(&self, other: &Aabb3, tolerance: f64) -> bool {
        for axis in 0..3 {
            if self.max[axis] + tolerance < other.min[axis]
                || other.max[axis] + tolerance < self.min[axis]
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn new_orders_corners() {
        let b = Aabb3::new(Point3::new(1.0, -1.0, 5.0), Point3::new(0.0, 2.0, 3.0));
        assert_eq!(b.min, Point3::new(0.0, -1.0, 3.0));
        assert_eq!(b.max, Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn from_points_empty_is_none() {
        let pts: Vec<Point3<f64>> = Vec::new();
        assert!(Aabb3::from_points(&pts).is_none());
    }

    #[test]
    fn tolerance_bridges_gap() {
        let a = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb3::new(Point3::new(1.2, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&b, 0.0));
        assert!(a.intersects(&b, 0.25));
        assert!(b.intersects(&a, 0.25));
    }

    #[test]
    fn transformed_box_covers_rotated_corners() {
        let b = Aabb3::new(Point3::origin(), Point3::new(2.0, 1.0, 1.0));
        let t = Transform3::from_rotation_z(FRAC_PI_2, Vector3::new(10.0, 0.0, 0.0));
        let r = b.transformed(&t);
        assert_relative_eq!(r.min.x, 9.0, epsilon = 1e-12);
        assert_relative_eq!(r.max.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(r.min.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.max.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn expanded_grows_every_side() {
        let b = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).expanded(0.5);
        assert_eq!(b.min, Point3::new(-0.5, -0.5, -0.5));
        assert_eq!(b.max, Point3::new(1.5, 1.5, 1.5));
    }
}
