// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector helpers shared by the frame builder and the projector.

use nalgebra::Vector3;

/// Vectors shorter than this are treated as degenerate.
pub const NORMALIZE_EPSILON: f64 = 1e-9;

/// World up axis of the host model.
#[inline]
pub fn world_up() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, 1.0)
}

/// Normalizes `v`, returning `None` for (near) zero-length vectors.
#[inline]
pub fn try_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    v.try_normalize(NORMALIZE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalizes_regular_vector() {
        let n = try_normalize(&Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert_relative_eq!(n.norm(), 1.0);
        assert_relative_eq!(n.x, 0.6);
        assert_relative_eq!(n.z, 0.8);
    }

    #[test]
    fn rejects_zero_vector() {
        assert!(try_normalize(&Vector3::zeros()).is_none());
        assert!(try_normalize(&Vector3::new(1e-12, 0.0, 0.0)).is_none());
    }
}
