// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinate-frame transforms between linked models and the host model.
//!
//! A linked model places its content in the host through a rigid transform
//! (rotation + translation). The matrix columns are the host-space
//! directions of the link's local axes, the last column its origin.

use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Affine 4x4 transform from a local frame into its parent frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "FrameRepr", into = "FrameRepr")]
pub struct Transform3 {
    matrix: Matrix4<f64>,
}

/// Serialized form: origin plus the three basis vectors
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FrameRepr {
    origin: Point3<f64>,
    basis_x: Vector3<f64>,
    basis_y: Vector3<f64>,
    basis_z: Vector3<f64>,
}

impl From<FrameRepr> for Transform3 {
    fn from(repr: FrameRepr) -> Self {
        Transform3::from_basis(repr.origin, repr.basis_x, repr.basis_y, repr.basis_z)
    }
}

impl From<Transform3> for FrameRepr {
    fn from(t: Transform3) -> Self {
        let m = &t.matrix;
        FrameRepr {
            origin: t.origin(),
            basis_x: Vector3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]),
            basis_y: Vector3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]),
            basis_z: Vector3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]),
        }
    }
}

impl Default for Transform3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform3 {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap a raw matrix
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Build from an origin and the parent-space directions of the local axes
    pub fn from_basis(
        origin: Point3<f64>,
        basis_x: Vector3<f64>,
        basis_y: Vector3<f64>,
        basis_z: Vector3<f64>,
    ) -> Self {
        let mut matrix = Matrix4::identity();
        for row in 0..3 {
            matrix[(row, 0)] = basis_x[row];
            matrix[(row, 1)] = basis_y[row];
            matrix[(row, 2)] = basis_z[row];
            matrix[(row, 3)] = origin[row];
        }
        Self { matrix }
    }

    /// Rotation about the world Z axis followed by a translation
    pub fn from_rotation_z(angle: f64, translation: Vector3<f64>) -> Self {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), angle);
        let mut matrix = rotation.to_homogeneous();
        matrix[(0, 3)] = translation.x;
        matrix[(1, 3)] = translation.y;
        matrix[(2, 3)] = translation.z;
        Self { matrix }
    }

    pub fn translation(offset: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn origin(&self) -> Point3<f64> {
        Point3::new(
            self.matrix[(0, 3)],
            self.matrix[(1, 3)],
            self.matrix[(2, 3)],
        )
    }

    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(p)
    }

    /// Transforms a direction (ignores translation)
    pub fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.matrix.transform_vector(v)
    }

    pub fn inverse(&self) -> Result<Self> {
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
            .ok_or(Error::SingularTransform)
    }
}
