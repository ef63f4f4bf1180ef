//! Drive a head tracker with synthetic IMU and 6DOF samples and print poses.
//!
//! The head turns at a constant yaw rate. 6DOF samples arrive for the first
//! second only, so the output switches from tracked position to the neck model.
//!
//! Usage: cargo run --example simulate

use headtrack::{AccelerometerData, GyroscopeData, HeadTracker, TrackerConfig, ViewportOrientation};
use nalgebra::{UnitQuaternion, Vector3};
use std::time::Duration;

const FRAME_NS: i64 = 16_666_667;
const IMU_PER_FRAME: i64 = 8;
const YAW_RATE: f64 = 0.5;
const FRAMES: i64 = 120;
const SIX_DOF_UNTIL_NS: i64 = 1_000_000_000;

fn main() {
    env_logger::init();

    let (mut tracker, feeds) = HeadTracker::new(TrackerConfig::default());
    tracker.resume();

    let imu_step = FRAME_NS / IMU_PER_FRAME;
    let mut imu_ts = 0i64;

    for frame in 0..FRAMES {
        let frame_ts = frame * FRAME_NS;

        while imu_ts <= frame_ts {
            let accel = AccelerometerData {
                sensor_timestamp_ns: imu_ts,
                system_timestamp_ns: imu_ts,
                data: Vector3::new(0.0, 9.81, 0.0),
            };
            let gyro = GyroscopeData {
                sensor_timestamp_ns: imu_ts,
                system_timestamp_ns: imu_ts,
                data: Vector3::new(0.0, YAW_RATE, 0.0),
            };
            if let Err(e) = feeds.push_accelerometer(accel).and_then(|_| feeds.push_gyroscope(gyro)) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            imu_ts += imu_step;
        }

        if frame_ts < SIX_DOF_UNTIL_NS {
            let t = frame_ts as f64 * 1e-9;
            let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), YAW_RATE * t);
            let q = yaw.quaternion();
            tracker.add_six_dof_data(
                frame_ts,
                [0.1 * t as f32, 0.0, 0.0],
                [q.i as f32, q.j as f32, q.k as f32, q.w as f32],
            );
        }

        // Let the sensor threads drain the queues before sampling the pose.
        std::thread::sleep(Duration::from_millis(2));

        if frame % 10 == 0 {
            let p = tracker.get_pose(frame_ts, ViewportOrientation::LandscapeLeft);
            println!(
                "ts={:<12}  pos=[{:+.4}, {:+.4}, {:+.4}]  quat=[{:+.3}, {:+.3}, {:+.3}, {:+.3}]  flags={:?}",
                frame_ts,
                p.position[0], p.position[1], p.position[2],
                p.orientation[0], p.orientation[1], p.orientation[2], p.orientation[3],
                p.flags,
            );
        }
    }

    tracker.pause();
    println!("Tracking stopped");
}
