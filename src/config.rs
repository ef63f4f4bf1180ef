use std::time::Duration;

/// Rotation samples kept for interpolation against 6DOF timestamps.
pub const ROTATION_SAMPLES: usize = 10;
/// Position samples kept for extrapolation.
pub const POSITION_SAMPLES: usize = 3;
/// Maximum age of the latest 6DOF sample, measured against the latest
/// rotation state, before the neck model takes over.
pub const MAX_SIX_DOF_TIME_DIFFERENCE_NS: i64 = 200_000_000;
/// Neck model scale used by the fallback branch.
pub const NECK_MODEL_FACTOR: f64 = 1.0;
/// Bounded capacity of each sensor sample channel.
pub const SENSOR_CHANNEL_CAPACITY: usize = 256;
/// How long a sensor thread blocks before re-checking its stop flag.
pub const SENSOR_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Tunables for a [`HeadTracker`](crate::HeadTracker).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub rotation_samples: usize,
    pub position_samples: usize,
    pub max_six_dof_time_difference_ns: i64,
    pub neck_model_factor: f64,
    pub sensor_channel_capacity: usize,
    pub sensor_poll_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rotation_samples: ROTATION_SAMPLES,
            position_samples: POSITION_SAMPLES,
            max_six_dof_time_difference_ns: MAX_SIX_DOF_TIME_DIFFERENCE_NS,
            neck_model_factor: NECK_MODEL_FACTOR,
            sensor_channel_capacity: SENSOR_CHANNEL_CAPACITY,
            sensor_poll_timeout: SENSOR_POLL_TIMEOUT,
        }
    }
}
