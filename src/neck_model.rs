use nalgebra::{UnitQuaternion, Vector3};

/// Eye position relative to the neck pivot, in meters: up, then forward (-Z).
const NECK_OFFSET: Vector3<f64> = Vector3::new(0.0, 0.075, -0.08);

/// Approximate head position for a display-space orientation.
///
/// The eyes sit on a fixed offset from a neck pivot; the pose orientation maps
/// world into head space, so the offset is rotated by its inverse. The rest
/// offset is subtracted so looking straight ahead maps to the origin.
/// `factor` scales the result and is clamped to [0, 1].
pub fn apply_neck_model(orientation: &UnitQuaternion<f64>, factor: f64) -> Vector3<f64> {
    let factor = factor.clamp(0.0, 1.0);
    let offset = orientation.inverse_transform_vector(&NECK_OFFSET) - NECK_OFFSET;
    offset * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_is_origin() {
        let p = apply_neck_model(&UnitQuaternion::identity(), 1.0);
        assert!(p.norm() < 1e-12);
    }

    #[test]
    fn test_quarter_pitch_offset() {
        let pitched = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let p = apply_neck_model(&pitched, 1.0);
        // Eyes swing from (0, 0.075, -0.08) to (0, -0.08, -0.075).
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - (-0.155)).abs() < 1e-12);
        assert!((p.z - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_factor_scales_and_clamps() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.7);
        let full = apply_neck_model(&q, 1.0);
        let half = apply_neck_model(&q, 0.5);
        assert!((half * 2.0 - full).norm() < 1e-12);
        assert!(apply_neck_model(&q, -1.0).norm() < 1e-12);
        assert!((apply_neck_model(&q, 3.0) - full).norm() < 1e-12);
    }

    #[test]
    fn test_offset_is_bounded_by_neck_length() {
        let q = UnitQuaternion::from_euler_angles(0.3, -1.1, 2.0);
        let p = apply_neck_model(&q, 1.0);
        assert!(p.norm() <= 2.0 * NECK_OFFSET.norm() + 1e-12);
    }
}
