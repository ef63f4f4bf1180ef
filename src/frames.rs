//! Constant frame rotations indexed by [`ViewportOrientation`].
//!
//! Three frames are involved in a pose query:
//! - the sensor-native frame the IMU reports in,
//! - the predictor's start frame (gravity along +Z once aligned),
//! - the display frame the renderer consumes.
//!
//! The tables are built once on first access and never mutated.

use crate::types::ViewportOrientation;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};
use std::sync::OnceLock;

/// Build a rotation from [qx, qy, qz, qw] components.
fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
}

fn about_vertical(angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle)
}

/// Rotation taking predictor output into display space, per viewport.
pub fn sensor_to_display(viewport: ViewportOrientation) -> &'static UnitQuaternion<f64> {
    static TABLE: OnceLock<[UnitQuaternion<f64>; 4]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        [
            // LandscapeLeft: +90 deg about Z.
            from_xyzw(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            // LandscapeRight: -90 deg about Z.
            from_xyzw(0.0, 0.0, -FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            // Portrait
            from_xyzw(0.0, 0.0, 0.0, 1.0),
            // PortraitUpsideDown: 180 deg about Z.
            from_xyzw(0.0, 0.0, 1.0, 0.0),
        ]
    });
    &table[viewport.index()]
}

/// Rotation taking the head-tracker frame into the predictor's start frame, per viewport.
pub fn ekf_to_head_tracker(viewport: ViewportOrientation) -> &'static UnitQuaternion<f64> {
    static TABLE: OnceLock<[UnitQuaternion<f64>; 4]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        [
            // LandscapeLeft: yaw -90, roll -90.
            from_xyzw(0.5, -0.5, -0.5, 0.5),
            // LandscapeRight: yaw 90, roll 90.
            from_xyzw(0.5, 0.5, 0.5, 0.5),
            // Portrait: yaw, pitch, roll all 90.
            from_xyzw(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2),
            // PortraitUpsideDown: yaw, pitch, roll all -90.
            from_xyzw(0.0, -FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0),
        ]
    });
    &table[viewport.index()]
}

/// Rotation to apply to the predictor baseline when the viewport changes
/// from `current` to `new`.
///
/// Correction angles about the start frame's vertical axis:
///
/// | Current\New | LL    | LR    | P     | PUD   |
/// |-------------|-------|-------|-------|-------|
/// | LL          | 0     | π     | -π/2  | π/2   |
/// | LR          | π     | 0     | π/2   | -π/2  |
/// | P           | π/2   | -π/2  | 0     | π     |
/// | PUD         | -π/2  | π/2   | π     | 0     |
pub fn viewport_change_compensation(
    current: ViewportOrientation,
    new: ViewportOrientation,
) -> &'static UnitQuaternion<f64> {
    static TABLE: OnceLock<[[UnitQuaternion<f64>; 4]; 4]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        const ANGLES: [[f64; 4]; 4] = [
            [0.0, PI, -FRAC_PI_2, FRAC_PI_2],
            [PI, 0.0, FRAC_PI_2, -FRAC_PI_2],
            [FRAC_PI_2, -FRAC_PI_2, 0.0, PI],
            [-FRAC_PI_2, FRAC_PI_2, PI, 0.0],
        ];
        ANGLES.map(|row| row.map(about_vertical))
    });
    &table[current.index()][new.index()]
}
