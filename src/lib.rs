//! # headtrack - head pose for head-mounted displays
//!
//! Fuses gyro-predicted head rotation with an optional external 6DOF tracker.
//! Provides:
//! - Per-frame pose queries in display space for any of the four viewport orientations
//! - Heading alignment against 6DOF samples, with a neck-model fallback when they go stale
//! - Channel-fed sensor sources driven by background threads
//! - C FFI for integration with C/C++/Unity/Swift
//!
//! ## Quick Start
//! ```no_run
//! use headtrack::{HeadTracker, TrackerConfig, ViewportOrientation};
//!
//! let (mut tracker, feeds) = HeadTracker::new(TrackerConfig::default());
//! tracker.resume();
//!
//! // Platform sensor code pushes samples through `feeds` on its own threads.
//! # let _ = feeds;
//! let pose = tracker.get_pose(16_000_000, ViewportOrientation::LandscapeLeft);
//! println!("pos: {:?} quat: {:?}", pose.position, pose.orientation);
//!
//! tracker.pause();
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod frames;
pub mod buffers;
pub mod neck_model;
pub mod predictor;
pub mod sensors;
pub mod head_tracker;
pub mod ffi;

pub use error::HeadTrackerError;
pub use types::*;
pub use config::TrackerConfig;
pub use head_tracker::HeadTracker;
pub use predictor::{RotationPredictor, RotationState, SensorFusion};
pub use sensors::{SensorCallback, SensorEventProducer, SensorFeeds, SensorSource};

/// Result type alias for headtrack operations.
pub type Result<T> = std::result::Result<T, HeadTrackerError>;
