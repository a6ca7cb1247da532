// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthetic building elements.
//!
//! Box walls and straight runs with exact planar geometry, for tests, demos
//! and hosts without a solid modeller.

use opening_lite_geometry::{try_normalize, world_up, Aabb3, Point3, RectUv, Vector3};

use crate::document::{
    CrossSection, ElementId, FaceRef, MepRun, PlanarFace, RunGeometry, SourceWall, WallLocation,
};

/// A straight box wall on the location line `start`–`end`, centred on that
/// line, rising `height` from the line's elevation.
///
/// Faces: the two sides (normals `±(U × Z)`), the two ends and top/bottom.
/// A vertical or zero-length location line yields a wall without faces.
pub fn straight_wall(
    id: ElementId,
    start: Point3<f64>,
    end: Point3<f64>,
    thickness: f64,
    height: f64,
) -> SourceWall {
    let up = world_up();
    let along = end - start;
    let horizontal = along - up * along.dot(&up);

    let mut faces = Vec::new();
    let mut corners = vec![start, end, start + up * height, end + up * height];

    if let Some(u) = try_normalize(&horizontal) {
        let n = u.cross(&up);
        let length = horizontal.norm();
        let half = n * (thickness * 0.5);
        let side_bounds = RectUv {
            umin: 0.0,
            umax: length,
            vmin: 0.0,
            vmax: height,
        };
        let end_bounds = RectUv {
            umin: -thickness * 0.5,
            umax: thickness * 0.5,
            vmin: 0.0,
            vmax: height,
        };

        let face = |name: &str,
                    origin: Point3<f64>,
                    normal: Vector3<f64>,
                    u_axis: Vector3<f64>,
                    v_axis: Vector3<f64>,
                    uv_bounds: RectUv| PlanarFace {
            reference: FaceRef(format!("{}:{}", id.0, name)),
            origin,
            normal,
            u_axis,
            v_axis,
            uv_bounds,
        };

        faces.push(face("side-a", start + half, n, u, up, side_bounds));
        faces.push(face("side-b", start - half, -n, u, up, side_bounds));
        faces.push(face("end-start", start, -u, n, up, end_bounds));
        faces.push(face("end-end", start + u * length, u, n, up, end_bounds));
        faces.push(face(
            "top",
            start + up * height,
            up,
            u,
            n,
            RectUv {
                umin: 0.0,
                umax: length,
                vmin: -thickness * 0.5,
                vmax: thickness * 0.5,
            },
        ));
        faces.push(face(
            "bottom",
            start,
            -up,
            u,
            n,
            RectUv {
                umin: 0.0,
                umax: length,
                vmin: -thickness * 0.5,
                vmax: thickness * 0.5,
            },
        ));

        corners = [start + half, start - half, end + half, end - half]
            .iter()
            .flat_map(|p| [*p, p + up * height])
            .collect();
    }

    SourceWall {
        id,
        location: Some(WallLocation::Curve { start, end }),
        thickness: Some(thickness),
        bounds: Aabb3::from_points(&corners),
        faces,
    }
}

/// A straight conduit of the given diameter.
pub fn conduit(id: ElementId, start: Point3<f64>, end: Point3<f64>, diameter: f64) -> MepRun {
    MepRun {
        id,
        category: "Conduits".into(),
        family: None,
        geometry: RunGeometry::Line { start, end },
        section: CrossSection {
            diameter: Some(diameter),
            ..Default::default()
        },
    }
}

/// A straight cable tray of the given width and height.
pub fn cable_tray(
    id: ElementId,
    start: Point3<f64>,
    end: Point3<f64>,
    width: f64,
    height: f64,
) -> MepRun {
    MepRun {
        id,
        category: "Cable Trays".into(),
        family: None,
        geometry: RunGeometry::Line { start, end },
        section: CrossSection {
            width: Some(width),
            height: Some(height),
            diameter: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wall_bounds_cover_thickness_and_height() {
        let wall = straight_wall(
            ElementId(1),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(4.0, 0.0, 1.0),
            0.2,
            3.0,
        );
        let b = wall.bounds.unwrap();
        assert_relative_eq!(b.min.x, 0.0);
        assert_relative_eq!(b.max.x, 4.0);
        assert_relative_eq!(b.min.y, -0.1);
        assert_relative_eq!(b.max.y, 0.1);
        assert_relative_eq!(b.min.z, 1.0);
        assert_relative_eq!(b.max.z, 4.0);
        assert_eq!(wall.faces.len(), 6);
    }

    #[test]
    fn side_faces_are_opposite() {
        let end = Point3::new(4.0, 0.0, 0.0);
        let wall = straight_wall(ElementId(1), Point3::origin(), end, 0.2, 3.0);
        let a = &wall.faces[0];
        let b = &wall.faces[1];
        assert_relative_eq!(a.normal.dot(&b.normal), -1.0);
        assert_relative_eq!((a.origin - b.origin).norm(), 0.2);
    }

    #[test]
    fn vertical_line_has_no_faces() {
        let end = Point3::new(0.0, 0.0, 3.0);
        let wall = straight_wall(ElementId(1), Point3::origin(), end, 0.2, 3.0);
        assert!(wall.faces.is_empty());
        assert!(wall.bounds.is_some());
    }
}
