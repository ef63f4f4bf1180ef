use crate::HeadTrackerError;
use nalgebra::Vector3;

/// Physical display rotation of the device.
///
/// Only used to index the frame rotation tables.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportOrientation {
    LandscapeLeft = 0,
    LandscapeRight = 1,
    Portrait = 2,
    PortraitUpsideDown = 3,
}

impl ViewportOrientation {
    pub const ALL: [ViewportOrientation; 4] = [
        ViewportOrientation::LandscapeLeft,
        ViewportOrientation::LandscapeRight,
        ViewportOrientation::Portrait,
        ViewportOrientation::PortraitUpsideDown,
    ];

    /// Table index for this orientation.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<i32> for ViewportOrientation {
    type Error = HeadTrackerError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ViewportOrientation::LandscapeLeft),
            1 => Ok(ViewportOrientation::LandscapeRight),
            2 => Ok(ViewportOrientation::Portrait),
            3 => Ok(ViewportOrientation::PortraitUpsideDown),
            other => Err(HeadTrackerError::InvalidViewport(other)),
        }
    }
}

/// Accelerometer sample in the sensor-native frame, m/s^2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerometerData {
    /// Sensor clock timestamp in nanoseconds.
    pub sensor_timestamp_ns: i64,
    /// Host clock timestamp in nanoseconds.
    pub system_timestamp_ns: i64,
    pub data: Vector3<f64>,
}

/// Gyroscope sample in the sensor-native frame, rad/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GyroscopeData {
    /// Sensor clock timestamp in nanoseconds.
    pub sensor_timestamp_ns: i64,
    /// Host clock timestamp in nanoseconds.
    pub system_timestamp_ns: i64,
    pub data: Vector3<f64>,
}

impl Default for AccelerometerData {
    fn default() -> Self {
        Self {
            sensor_timestamp_ns: 0,
            system_timestamp_ns: 0,
            data: Vector3::zeros(),
        }
    }
}

impl Default for GyroscopeData {
    fn default() -> Self {
        Self {
            sensor_timestamp_ns: 0,
            system_timestamp_ns: 0,
            data: Vector3::zeros(),
        }
    }
}

bitflags::bitflags! {
    /// Which estimation branch produced a [`Pose`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct PoseFlags: u32 {
        /// Orientation yaw-aligned to, and position extrapolated from, fresh 6DOF data.
        const SIX_DOF             = 1 << 0;
        /// Position estimated by the neck model.
        const NECK_MODEL          = 1 << 1;
        /// Last known 6DOF position added to the neck model offset.
        const LAST_KNOWN_POSITION = 1 << 2;
    }
}

/// Head pose in display space for one rendered frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position [x, y, z] in meters.
    pub position: [f32; 3],
    /// Quaternion [qx, qy, qz, qw].
    pub orientation: [f32; 4],
    pub flags: PoseFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_from_i32() {
        for viewport in ViewportOrientation::ALL {
            let raw = viewport as i32;
            assert_eq!(ViewportOrientation::try_from(raw).unwrap(), viewport);
        }
        assert!(matches!(
            ViewportOrientation::try_from(4),
            Err(HeadTrackerError::InvalidViewport(4))
        ));
        assert!(ViewportOrientation::try_from(-1).is_err());
    }

    #[test]
    fn test_viewport_index_order() {
        assert_eq!(ViewportOrientation::LandscapeLeft.index(), 0);
        assert_eq!(ViewportOrientation::LandscapeRight.index(), 1);
        assert_eq!(ViewportOrientation::Portrait.index(), 2);
        assert_eq!(ViewportOrientation::PortraitUpsideDown.index(), 3);
    }
}
