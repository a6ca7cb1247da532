// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opening-Lite Geometry
//!
//! Small, host-independent geometry primitives used by the penetration
//! engine: planes, axis-aligned 3D bounds, rectangles in a wall's (U,V)
//! surface frame and rigid coordinate-frame transforms between linked
//! models and the host model. Built on nalgebra.

pub mod bounds;
pub mod error;
pub mod plane;
pub mod rect;
pub mod transform;
pub mod vector;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use bounds::Aabb3;
pub use error::{Error, Result};
pub use plane::{Plane, SegmentHit};
pub use rect::RectUv;
pub use transform::Transform3;
pub use vector::{try_normalize, world_up, NORMALIZE_EPSILON};
