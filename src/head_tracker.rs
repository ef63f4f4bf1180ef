//! Per-frame head pose orchestration.
//!
//! The [`HeadTracker`] owns a [`RotationPredictor`], the rotation and position
//! ring buffers and the yaw alignment against an external 6DOF tracker.
//! Sensor sources deliver samples on their own threads; pose queries and 6DOF
//! ingestion come from the render thread. All of that shared state lives in one
//! mutex-guarded core record, and every critical section is a constant-time
//! sample insert or query.

use crate::buffers::{PositionData, RotationData};
use crate::config::TrackerConfig;
use crate::frames;
use crate::neck_model::apply_neck_model;
use crate::predictor::{RotationPredictor, SensorFusion};
use crate::sensors::{SensorCallback, SensorEventProducer, SensorFeeds, SensorSource};
use crate::types::{AccelerometerData, GyroscopeData, Pose, PoseFlags, ViewportOrientation};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Quaternions with a norm below this are treated as degenerate.
const MIN_QUATERNION_NORM: f64 = 1e-9;

/// State shared between sensor callbacks and the render thread.
struct TrackerCore<P> {
    predictor: P,
    rotation_data: RotationData,
    position_data: PositionData,
    /// Heading misalignment between the gyro and the 6DOF tracker, yaw only.
    difference_to_six_dof: UnitQuaternion<f64>,
    is_tracking: bool,
    /// `None` until the first pose query.
    viewport_orientation: Option<ViewportOrientation>,
    latest_gyroscope_data: GyroscopeData,
    max_six_dof_time_difference_ns: i64,
    neck_model_factor: f64,
}

impl<P: RotationPredictor> TrackerCore<P> {
    fn on_accelerometer_data(&mut self, event: &AccelerometerData) {
        if !self.is_tracking {
            return;
        }
        self.predictor.process_accelerometer_sample(event);
    }

    fn on_gyroscope_data(&mut self, event: &GyroscopeData) {
        if !self.is_tracking {
            return;
        }
        self.latest_gyroscope_data = *event;
        self.predictor.process_gyroscope_sample(event);
    }

    /// Predicted rotation in display space.
    ///
    /// Head-tracker frame into the predictor's start frame, through the
    /// prediction into the sensor frame, then into display space.
    fn rotation(&self, viewport: ViewportOrientation, timestamp_ns: i64) -> UnitQuaternion<f64> {
        let predicted = self.predictor.predict_rotation(timestamp_ns);
        frames::sensor_to_display(viewport) * predicted * frames::ekf_to_head_tracker(viewport)
    }

    fn is_six_dof_fresh(&self) -> bool {
        if !self.position_data.is_valid() {
            return false;
        }
        let latest_rotation = self.predictor.latest_rotation_state().timestamp;
        match self.position_data.latest_timestamp() {
            Some(latest_position) => {
                latest_rotation.saturating_sub(latest_position) < self.max_six_dof_time_difference_ns
            }
            None => false,
        }
    }

    fn pose(&mut self, timestamp_ns: i64, viewport: ViewportOrientation) -> Pose {
        let rotation = self.rotation(viewport, timestamp_ns);

        if let Some(current) = self.viewport_orientation {
            if current != viewport {
                log::debug!("Viewport changed {:?} -> {:?}", current, viewport);
                let compensation = frames::viewport_change_compensation(current, viewport);
                self.predictor
                    .rotate_sensor_space_to_start_space_transformation(compensation);
            }
        }
        self.viewport_orientation = Some(viewport);

        // Kept so later 6DOF samples can be compared with what we reported.
        self.rotation_data.add_sample(rotation, timestamp_ns);

        if self.is_six_dof_fresh() {
            let orientation = rotation * self.difference_to_six_dof.inverse();
            let position = self
                .position_data
                .extrapolated_for_timestamp(timestamp_ns)
                .unwrap_or_else(Vector3::zeros);
            return to_pose(&position, &orientation, PoseFlags::SIX_DOF);
        }

        let mut position = apply_neck_model(&rotation, self.neck_model_factor);
        let mut flags = PoseFlags::NECK_MODEL;

        if self.position_data.is_valid() {
            if let Some(last_known) = self.position_data.latest_data() {
                position += last_known;
                flags |= PoseFlags::LAST_KNOWN_POSITION;
            }
        }

        to_pose(&position, &rotation, flags)
    }

    fn add_six_dof_data(&mut self, timestamp_ns: i64, position: [f32; 3], orientation: [f32; 4]) {
        if !self.is_tracking {
            return;
        }

        let position = Vector3::new(position[0] as f64, position[1] as f64, position[2] as f64);
        self.position_data.add_sample(position, timestamp_ns);

        if !(self.position_data.is_valid() && self.rotation_data.is_valid()) {
            return;
        }

        // Should not postdate the newest rotation sample; if it does we clamp
        // to that sample rather than reject.
        let Some(gyro_at_six_dof) = self.rotation_data.interpolated_for_timestamp(timestamp_ns)
        else {
            return;
        };

        // Keep only the heading of the 6DOF orientation.
        let yaw_only = Quaternion::new(orientation[3] as f64, 0.0, orientation[1] as f64, 0.0);
        let Some(six_dof_rotation) = UnitQuaternion::try_new(yaw_only, MIN_QUATERNION_NORM) else {
            log::trace!("Degenerate 6DOF orientation at {}, keeping alignment", timestamp_ns);
            return;
        };

        let difference = gyro_at_six_dof * six_dof_rotation.inverse();
        let q = difference.quaternion();
        let yaw_difference = Quaternion::new(q.w, 0.0, q.j, 0.0);

        match UnitQuaternion::try_new(yaw_difference, MIN_QUATERNION_NORM) {
            Some(aligned) => {
                log::trace!(
                    "6DOF yaw alignment updated to {:.4} rad",
                    aligned.scaled_axis().y
                );
                self.difference_to_six_dof = aligned;
            }
            None => log::trace!("6DOF yaw difference degenerate, keeping alignment"),
        }
    }
}

fn to_pose(position: &Vector3<f64>, orientation: &UnitQuaternion<f64>, flags: PoseFlags) -> Pose {
    let q = orientation.quaternion();
    Pose {
        position: [position.x as f32, position.y as f32, position.z as f32],
        orientation: [q.i as f32, q.j as f32, q.k as f32, q.w as f32],
        flags,
    }
}

/// Head pose tracker for one session.
///
/// Starts stopped. [`resume`](Self::resume) registers the sensor callbacks,
/// [`pause`](Self::pause) removes them. Pose queries and 6DOF ingestion never
/// fail; missing or stale data falls back to the neck model.
pub struct HeadTracker<P: RotationPredictor = SensorFusion> {
    core: Arc<Mutex<TrackerCore<P>>>,
    accel_source: Box<dyn SensorSource<AccelerometerData>>,
    gyro_source: Box<dyn SensorSource<GyroscopeData>>,
}

impl HeadTracker<SensorFusion> {
    /// Create a tracker backed by [`SensorFusion`] and channel-fed sensor sources.
    ///
    /// Platform sensor code pushes samples through the returned [`SensorFeeds`].
    pub fn new(config: TrackerConfig) -> (Self, SensorFeeds) {
        let (accelerometer, accel_source) = SensorEventProducer::<AccelerometerData>::with_channel(
            "headtrack-accel",
            config.sensor_channel_capacity,
            config.sensor_poll_timeout,
        );
        let (gyroscope, gyro_source) = SensorEventProducer::<GyroscopeData>::with_channel(
            "headtrack-gyro",
            config.sensor_channel_capacity,
            config.sensor_poll_timeout,
        );

        let tracker = Self::with_sources(
            &config,
            SensorFusion::new(),
            Box::new(accel_source),
            Box::new(gyro_source),
        );
        (
            tracker,
            SensorFeeds {
                accelerometer,
                gyroscope,
            },
        )
    }
}

impl<P: RotationPredictor> HeadTracker<P> {
    /// Create a stopped tracker around a custom predictor and sensor sources.
    pub fn with_sources(
        config: &TrackerConfig,
        predictor: P,
        accel_source: Box<dyn SensorSource<AccelerometerData>>,
        gyro_source: Box<dyn SensorSource<GyroscopeData>>,
    ) -> Self {
        let core = TrackerCore {
            predictor,
            rotation_data: RotationData::new(config.rotation_samples),
            position_data: PositionData::new(config.position_samples),
            difference_to_six_dof: UnitQuaternion::identity(),
            is_tracking: false,
            viewport_orientation: None,
            latest_gyroscope_data: GyroscopeData::default(),
            max_six_dof_time_difference_ns: config.max_six_dof_time_difference_ns,
            neck_model_factor: config.neck_model_factor,
        };

        Self {
            core: Arc::new(Mutex::new(core)),
            accel_source,
            gyro_source,
        }
    }

    /// Lock the shared state. A panic in a sensor callback must not take the
    /// render thread down with it, so poisoning is ignored.
    fn core(&self) -> MutexGuard<'_, TrackerCore<P>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_tracking(&self) -> bool {
        self.core().is_tracking
    }

    /// Start tracking and register the sensor callbacks.
    pub fn resume(&mut self) {
        self.core().is_tracking = true;
        self.register_callbacks();
        log::info!("Head tracking resumed");
    }

    /// Stop tracking.
    ///
    /// Sensor callbacks are unregistered before returning, then a zero angular
    /// velocity gyroscope sample is fed to the predictor so its extrapolation
    /// stops instead of drifting on the last velocity.
    pub fn pause(&mut self) {
        if !self.is_tracking() {
            return;
        }

        // Must not hold the core lock here: stopping joins the sensor threads,
        // which may be waiting on it.
        self.unregister_callbacks();

        let mut core = self.core();
        let event = GyroscopeData {
            data: Vector3::zeros(),
            ..core.latest_gyroscope_data
        };
        core.on_gyroscope_data(&event);
        core.is_tracking = false;
        log::info!("Head tracking paused");
    }

    /// Make the current head orientation the new zero.
    ///
    /// Buffered samples and the 6DOF yaw alignment are kept.
    pub fn recenter(&self) {
        self.core().predictor.reset();
        log::debug!("Head tracker recentered");
    }

    /// Head pose for a frame displayed at `timestamp_ns`.
    pub fn get_pose(&self, timestamp_ns: i64, viewport: ViewportOrientation) -> Pose {
        self.core().pose(timestamp_ns, viewport)
    }

    /// Display-space rotation predicted for `timestamp_ns`, without any
    /// viewport bookkeeping or 6DOF alignment.
    pub fn get_rotation(&self, viewport: ViewportOrientation, timestamp_ns: i64) -> UnitQuaternion<f64> {
        self.core().rotation(viewport, timestamp_ns)
    }

    /// Feed an absolute sample from an external 6DOF tracker.
    ///
    /// `orientation` is [qx, qy, qz, qw] and is expected to be normalized.
    /// Only its heading is used. The timestamp should not be newer than the
    /// latest pose query.
    pub fn add_six_dof_data(&self, timestamp_ns: i64, position: [f32; 3], orientation: [f32; 4]) {
        self.core().add_six_dof_data(timestamp_ns, position, orientation);
    }

    /// Deliver an accelerometer sample directly. Ignored while stopped.
    pub fn on_accelerometer_data(&self, event: &AccelerometerData) {
        self.core().on_accelerometer_data(event);
    }

    /// Deliver a gyroscope sample directly. Ignored while stopped.
    pub fn on_gyroscope_data(&self, event: &GyroscopeData) {
        self.core().on_gyroscope_data(event);
    }

    /// Current heading correction applied to fresh 6DOF poses.
    pub fn six_dof_alignment(&self) -> UnitQuaternion<f64> {
        self.core().difference_to_six_dof
    }

    fn register_callbacks(&mut self) {
        let core = self.core.clone();
        let on_accel: SensorCallback<AccelerometerData> = Arc::new(move |event: &AccelerometerData| {
            core.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .on_accelerometer_data(event);
        });
        if let Err(e) = self.accel_source.start_polling(on_accel) {
            log::error!("Accelerometer unavailable: {}", e);
        }

        let core = self.core.clone();
        let on_gyro: SensorCallback<GyroscopeData> = Arc::new(move |event: &GyroscopeData| {
            core.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .on_gyroscope_data(event);
        });
        if let Err(e) = self.gyro_source.start_polling(on_gyro) {
            log::error!("Gyroscope unavailable: {}", e);
        }
    }

    fn unregister_callbacks(&mut self) {
        self.accel_source.stop_polling();
        self.gyro_source.stop_polling();
    }
}

impl<P: RotationPredictor> Drop for HeadTracker<P> {
    fn drop(&mut self) {
        self.unregister_callbacks();
    }
}
