//! Rotation prediction from inertial samples.
//!
//! [`RotationPredictor`] is the seam the [`HeadTracker`](crate::HeadTracker) talks to.
//! [`SensorFusion`] is the default implementation: it integrates gyroscope
//! angular velocity and pulls the start frame's vertical axis toward the
//! measured gravity direction.

use crate::types::{AccelerometerData, GyroscopeData};
use nalgebra::{UnitQuaternion, Vector3};
use std::f64::consts::PI;

/// Gain of the accelerometer tilt correction once aligned with gravity.
const ACCELEROMETER_GAIN: f64 = 0.02;
/// Gyro gaps longer than this are not integrated (sensor hiccup or pause).
const MAX_GYROSCOPE_DT_S: f64 = 0.04;
/// Accelerometer readings outside this band are too far from 1 g to trust for tilt.
const MIN_GRAVITY_NORM: f64 = 0.5 * 9.80665;
const MAX_GRAVITY_NORM: f64 = 1.5 * 9.80665;
/// Prediction horizon clamp, seconds either side of the latest state.
const MAX_PREDICTION_S: f64 = 0.5;

const NANOS_PER_SECOND: f64 = 1e9;

/// Latest filter output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    /// Sensor timestamp of the gyroscope sample that produced this state.
    pub timestamp: i64,
    /// Rotation taking start-frame vectors into the sensor frame.
    pub sensor_from_start_rotation: UnitQuaternion<f64>,
    /// Angular velocity in the sensor frame, rad/s.
    pub sensor_from_start_rotation_velocity: Vector3<f64>,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            timestamp: 0,
            sensor_from_start_rotation: UnitQuaternion::identity(),
            sensor_from_start_rotation_velocity: Vector3::zeros(),
        }
    }
}

/// Inertial rotation estimator consumed by the head tracker.
pub trait RotationPredictor: Send + 'static {
    fn process_accelerometer_sample(&mut self, sample: &AccelerometerData);

    fn process_gyroscope_sample(&mut self, sample: &GyroscopeData);

    /// Sensor-from-start rotation expected at `timestamp_ns`.
    fn predict_rotation(&self, timestamp_ns: i64) -> UnitQuaternion<f64>;

    fn latest_rotation_state(&self) -> RotationState;

    /// Pre-apply `rotation` on the start-frame side of the current baseline.
    fn rotate_sensor_space_to_start_space_transformation(&mut self, rotation: &UnitQuaternion<f64>);

    /// Make the current orientation the new zero.
    fn reset(&mut self);
}

/// Gyro-integrating predictor with accelerometer tilt correction.
#[derive(Debug, Clone)]
pub struct SensorFusion {
    state: RotationState,
    last_gyroscope_timestamp: Option<i64>,
    is_aligned_with_gravity: bool,
}

impl SensorFusion {
    pub fn new() -> Self {
        Self {
            state: RotationState::default(),
            last_gyroscope_timestamp: None,
            is_aligned_with_gravity: false,
        }
    }

    /// Whether the start frame has been aligned with a gravity reading since
    /// construction or the last reset.
    pub fn is_aligned_with_gravity(&self) -> bool {
        self.is_aligned_with_gravity
    }
}

impl Default for SensorFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationPredictor for SensorFusion {
    fn process_accelerometer_sample(&mut self, sample: &AccelerometerData) {
        let norm = sample.data.norm();
        if !(MIN_GRAVITY_NORM..=MAX_GRAVITY_NORM).contains(&norm) {
            log::trace!("Ignoring accelerometer sample with norm {:.3}", norm);
            return;
        }

        // At rest the accelerometer reads +1 g along the sensor-frame up direction.
        let measured_up = sample.data / norm;
        let predicted_up = self.state.sensor_from_start_rotation * Vector3::z();

        let correction = match UnitQuaternion::rotation_between(&predicted_up, &measured_up) {
            Some(c) => c,
            // Antiparallel: any horizontal axis works, but only for the initial alignment.
            None if !self.is_aligned_with_gravity => {
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI)
            }
            None => return,
        };

        let correction = if self.is_aligned_with_gravity {
            correction.powf(ACCELEROMETER_GAIN)
        } else {
            self.is_aligned_with_gravity = true;
            correction
        };

        self.state.sensor_from_start_rotation = correction * self.state.sensor_from_start_rotation;
    }

    fn process_gyroscope_sample(&mut self, sample: &GyroscopeData) {
        let timestamp = sample.sensor_timestamp_ns;

        if let Some(previous) = self.last_gyroscope_timestamp {
            let dt = timestamp.saturating_sub(previous) as f64 / NANOS_PER_SECOND;
            if dt > 0.0 && dt <= MAX_GYROSCOPE_DT_S {
                let delta = UnitQuaternion::from_scaled_axis(-sample.data * dt);
                self.state.sensor_from_start_rotation = delta * self.state.sensor_from_start_rotation;
            } else if dt > MAX_GYROSCOPE_DT_S {
                log::trace!("Gyroscope gap of {:.3}s, not integrating", dt);
            }
        }

        self.last_gyroscope_timestamp = Some(timestamp);
        self.state.timestamp = timestamp;
        self.state.sensor_from_start_rotation_velocity = sample.data;
    }

    fn predict_rotation(&self, timestamp_ns: i64) -> UnitQuaternion<f64> {
        let dt = (timestamp_ns.saturating_sub(self.state.timestamp) as f64 / NANOS_PER_SECOND)
            .clamp(-MAX_PREDICTION_S, MAX_PREDICTION_S);
        let delta =
            UnitQuaternion::from_scaled_axis(-self.state.sensor_from_start_rotation_velocity * dt);
        delta * self.state.sensor_from_start_rotation
    }

    fn latest_rotation_state(&self) -> RotationState {
        self.state
    }

    fn rotate_sensor_space_to_start_space_transformation(&mut self, rotation: &UnitQuaternion<f64>) {
        self.state.sensor_from_start_rotation = self.state.sensor_from_start_rotation * rotation;
    }

    fn reset(&mut self) {
        self.state = RotationState {
            timestamp: self.state.timestamp,
            ..RotationState::default()
        };
        self.last_gyroscope_timestamp = None;
        self.is_aligned_with_gravity = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn gyro(timestamp_ns: i64, x: f64, y: f64, z: f64) -> GyroscopeData {
        GyroscopeData {
            sensor_timestamp_ns: timestamp_ns,
            system_timestamp_ns: timestamp_ns,
            data: Vector3::new(x, y, z),
        }
    }

    fn accel(x: f64, y: f64, z: f64) -> AccelerometerData {
        AccelerometerData {
            data: Vector3::new(x, y, z),
            ..AccelerometerData::default()
        }
    }

    #[test]
    fn test_fresh_predictor_is_identity() {
        let fusion = SensorFusion::new();
        assert_eq!(fusion.predict_rotation(123_456), UnitQuaternion::identity());
        assert_eq!(fusion.latest_rotation_state().timestamp, 0);
    }

    #[test]
    fn test_gyro_integration() {
        let mut fusion = SensorFusion::new();
        // 1 rad/s about Z for 10 x 10 ms.
        for i in 0..=10 {
            fusion.process_gyroscope_sample(&gyro(i * 10_000_000, 0.0, 0.0, 1.0));
        }
        let state = fusion.latest_rotation_state();
        assert_eq!(state.timestamp, 100_000_000);
        assert!((state.sensor_from_start_rotation.angle() - 0.1).abs() < 1e-9);
        assert!((state.sensor_from_start_rotation_velocity.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_extrapolates_velocity() {
        let mut fusion = SensorFusion::new();
        fusion.process_gyroscope_sample(&gyro(0, 0.0, 0.0, 2.0));

        let ahead = fusion.predict_rotation(50_000_000);
        assert!((ahead.angle() - 0.1).abs() < 1e-9);

        let far = fusion.predict_rotation(10_000_000_000);
        assert!((far.angle() - 2.0 * MAX_PREDICTION_S).abs() < 1e-9);
    }

    #[test]
    fn test_zero_velocity_sample_halts_prediction() {
        let mut fusion = SensorFusion::new();
        fusion.process_gyroscope_sample(&gyro(0, 0.0, 1.0, 0.0));
        fusion.process_gyroscope_sample(&gyro(10_000_000, 0.0, 1.0, 0.0));
        let before = fusion.predict_rotation(10_000_000);

        fusion.process_gyroscope_sample(&gyro(10_000_000, 0.0, 0.0, 0.0));
        let later = fusion.predict_rotation(300_000_000);
        assert!(later.angle_to(&before) < 1e-6);
    }

    #[test]
    fn test_first_accelerometer_sample_aligns_gravity() {
        let mut fusion = SensorFusion::new();
        // Device lying on its side: gravity reaction along sensor +X.
        fusion.process_accelerometer_sample(&accel(9.81, 0.0, 0.0));
        assert!(fusion.is_aligned_with_gravity());

        let up = fusion.latest_rotation_state().sensor_from_start_rotation * Vector3::z();
        assert!((up - Vector3::x()).norm() < 1e-9);
    }

    #[test]
    fn test_tilt_correction_is_gradual() {
        let mut fusion = SensorFusion::new();
        fusion.process_accelerometer_sample(&accel(0.0, 0.0, 9.81));
        fusion.process_accelerometer_sample(&accel(0.0, 9.81, 0.0));

        let rotation = fusion.latest_rotation_state().sensor_from_start_rotation;
        let expected = FRAC_PI_2 * ACCELEROMETER_GAIN;
        assert!((rotation.angle() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let mut fusion = SensorFusion::new();
        fusion.process_gyroscope_sample(&gyro(i64::MAX, 0.0, 0.0, 1.0));
        fusion.process_gyroscope_sample(&gyro(i64::MIN, 0.0, 0.0, 1.0));
        assert_eq!(fusion.latest_rotation_state().sensor_from_start_rotation, UnitQuaternion::identity());

        let far = fusion.predict_rotation(i64::MAX);
        assert!((far.angle() - MAX_PREDICTION_S).abs() < 1e-9);
    }

    #[test]
    fn test_implausible_accelerometer_ignored() {
        let mut fusion = SensorFusion::new();
        fusion.process_accelerometer_sample(&accel(0.0, 0.0, 0.1));
        assert!(!fusion.is_aligned_with_gravity());
    }

    #[test]
    fn test_baseline_rotation_applied_on_start_side() {
        let mut fusion = SensorFusion::new();
        fusion.process_accelerometer_sample(&accel(9.81, 0.0, 0.0));
        let before = fusion.latest_rotation_state().sensor_from_start_rotation;

        let c = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        fusion.rotate_sensor_space_to_start_space_transformation(&c);

        let after = fusion.latest_rotation_state().sensor_from_start_rotation;
        assert!(after.angle_to(&(before * c)) < 1e-6);
        // A vertical-axis change of baseline leaves the gravity direction alone.
        assert!((after * Vector3::z() - before * Vector3::z()).norm() < 1e-9);
    }

    #[test]
    fn test_reset_keeps_timestamp() {
        let mut fusion = SensorFusion::new();
        fusion.process_accelerometer_sample(&accel(0.0, 9.81, 0.0));
        fusion.process_gyroscope_sample(&gyro(5_000, 1.0, 0.0, 0.0));

        fusion.reset();

        let state = fusion.latest_rotation_state();
        assert_eq!(state.timestamp, 5_000);
        assert_eq!(state.sensor_from_start_rotation, UnitQuaternion::identity());
        assert_eq!(state.sensor_from_start_rotation_velocity, Vector3::zeros());
        assert!(!fusion.is_aligned_with_gravity());
    }
}
