//! C FFI layer for headtrack.
//!
//! Provides an opaque handle-based API for C/C++ consumers.
//! The generated C header is written to `include/headtrack.h` by cbindgen.

use crate::error::LastError;
use crate::head_tracker::HeadTracker;
use crate::sensors::SensorFeeds;
use crate::types::{AccelerometerData, GyroscopeData, ViewportOrientation};
use crate::{HeadTrackerError, TrackerConfig};
use nalgebra::Vector3;
use std::ffi::{c_char, c_int};

/// Last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Opaque head tracker handle for C consumers.
pub struct HtHeadTracker {
    tracker: HeadTracker,
    feeds: SensorFeeds,
}

fn fail(err: HeadTrackerError) -> c_int {
    LAST_ERROR.set(&err);
    -1
}

/// Create a head tracker with default configuration. It starts paused.
/// Free with `ht_head_tracker_destroy`.
#[no_mangle]
pub extern "C" fn ht_head_tracker_create() -> *mut HtHeadTracker {
    let (tracker, feeds) = HeadTracker::new(TrackerConfig::default());
    Box::into_raw(Box::new(HtHeadTracker { tracker, feeds }))
}

/// Stop tracking and free the tracker.
///
/// # Safety
/// `tracker` must be a pointer returned by `ht_head_tracker_create`, or null.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_destroy(tracker: *mut HtHeadTracker) {
    if !tracker.is_null() {
        drop(Box::from_raw(tracker));
    }
}

/// Start tracking.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_resume(tracker: *mut HtHeadTracker) {
    if let Some(t) = tracker.as_mut() {
        t.tracker.resume();
    }
}

/// Stop tracking. Returns once no sensor callback can run anymore.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_pause(tracker: *mut HtHeadTracker) {
    if let Some(t) = tracker.as_mut() {
        t.tracker.pause();
    }
}

/// Make the current orientation the new zero.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_recenter(tracker: *mut HtHeadTracker) {
    if let Some(t) = tracker.as_ref() {
        t.tracker.recenter();
    }
}

/// Get the head pose for a frame displayed at `timestamp_ns`.
/// `viewport_orientation`: 0 = landscape left, 1 = landscape right,
/// 2 = portrait, 3 = portrait upside down.
/// Writes [x, y, z] to `position` and [qx, qy, qz, qw] to `orientation`.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, `position` must point to 3 floats
/// and `orientation` to 4 floats. Any of them may be null, which is reported as an error.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_get_pose(
    tracker: *const HtHeadTracker,
    timestamp_ns: i64,
    viewport_orientation: c_int,
    position: *mut f32,
    orientation: *mut f32,
) -> c_int {
    let Some(t) = tracker.as_ref() else {
        return fail(HeadTrackerError::NullPointer("tracker"));
    };
    if position.is_null() || orientation.is_null() {
        return fail(HeadTrackerError::NullPointer("pose output"));
    }
    let viewport = match ViewportOrientation::try_from(viewport_orientation) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };

    let pose = t.tracker.get_pose(timestamp_ns, viewport);
    position.cast::<[f32; 3]>().write_unaligned(pose.position);
    orientation.cast::<[f32; 4]>().write_unaligned(pose.orientation);
    0
}

/// Feed an absolute sample from an external 6DOF tracker.
/// `position` is [x, y, z], `orientation` is [qx, qy, qz, qw].
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, `position` must point to 3 floats
/// and `orientation` to 4 floats.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_add_six_dof_data(
    tracker: *const HtHeadTracker,
    timestamp_ns: i64,
    position: *const f32,
    orientation: *const f32,
) -> c_int {
    let Some(t) = tracker.as_ref() else {
        return fail(HeadTrackerError::NullPointer("tracker"));
    };
    if position.is_null() || orientation.is_null() {
        return fail(HeadTrackerError::NullPointer("6DOF sample"));
    }

    let position = position.cast::<[f32; 3]>().read_unaligned();
    let orientation = orientation.cast::<[f32; 4]>().read_unaligned();
    t.tracker.add_six_dof_data(timestamp_ns, position, orientation);
    0
}

/// Queue an accelerometer sample (m/s^2, sensor frame).
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_push_accelerometer(
    tracker: *const HtHeadTracker,
    sensor_timestamp_ns: i64,
    system_timestamp_ns: i64,
    x: f32,
    y: f32,
    z: f32,
) -> c_int {
    let Some(t) = tracker.as_ref() else {
        return fail(HeadTrackerError::NullPointer("tracker"));
    };
    let sample = AccelerometerData {
        sensor_timestamp_ns,
        system_timestamp_ns,
        data: Vector3::new(x as f64, y as f64, z as f64),
    };
    match t.feeds.push_accelerometer(sample) {
        Ok(()) => 0,
        Err(e) => fail(e),
    }
}

/// Queue a gyroscope sample (rad/s, sensor frame).
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn ht_head_tracker_push_gyroscope(
    tracker: *const HtHeadTracker,
    sensor_timestamp_ns: i64,
    system_timestamp_ns: i64,
    x: f32,
    y: f32,
    z: f32,
) -> c_int {
    let Some(t) = tracker.as_ref() else {
        return fail(HeadTrackerError::NullPointer("tracker"));
    };
    let sample = GyroscopeData {
        sensor_timestamp_ns,
        system_timestamp_ns,
        data: Vector3::new(x as f64, y as f64, z as f64),
    };
    match t.feeds.push_gyroscope(sample) {
        Ok(()) => 0,
        Err(e) => fail(e),
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next headtrack API call.
#[no_mangle]
pub extern "C" fn ht_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}
