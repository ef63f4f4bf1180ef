//! Fixed-capacity, timestamp-ordered sample stores.
//!
//! [`RotationData`] keeps the display-space rotations produced by pose queries so
//! 6DOF samples can be matched against what the gyro reported at the same time.
//! [`PositionData`] keeps absolute positions from the 6DOF source.
//!
//! Samples are assumed to arrive with non-decreasing timestamps. This is not
//! enforced; out-of-order input only degrades query quality.

use nalgebra::{UnitQuaternion, Vector3};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timed<T> {
    timestamp_ns: i64,
    value: T,
}

/// Ring of timed samples that evicts the oldest entry once full.
#[derive(Debug, Clone)]
struct TimedRing<T> {
    capacity: usize,
    samples: VecDeque<Timed<T>>,
}

impl<T: Copy> TimedRing<T> {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: T, timestamp_ns: i64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Timed {
            timestamp_ns,
            value,
        });
    }

    fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    fn oldest(&self) -> Option<&Timed<T>> {
        self.samples.front()
    }

    fn latest(&self) -> Option<&Timed<T>> {
        self.samples.back()
    }

    /// Consecutive sample pairs, oldest first.
    fn pairs(&self) -> impl Iterator<Item = (&Timed<T>, &Timed<T>)> {
        self.samples.iter().zip(self.samples.iter().skip(1))
    }
}

/// Rotation history used to interpolate the gyro orientation at a past timestamp.
#[derive(Debug, Clone)]
pub struct RotationData {
    ring: TimedRing<UnitQuaternion<f64>>,
}

impl RotationData {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: TimedRing::new(capacity),
        }
    }

    pub fn add_sample(&mut self, rotation: UnitQuaternion<f64>, timestamp_ns: i64) {
        self.ring.push(rotation, timestamp_ns);
    }

    /// True once the buffer has filled to capacity.
    pub fn is_valid(&self) -> bool {
        self.ring.is_full()
    }

    pub fn latest_timestamp(&self) -> Option<i64> {
        self.ring.latest().map(|s| s.timestamp_ns)
    }

    /// Rotation at `timestamp_ns`, slerped between the bracketing samples.
    ///
    /// Timestamps outside the stored range clamp to the oldest or latest sample.
    pub fn interpolated_for_timestamp(&self, timestamp_ns: i64) -> Option<UnitQuaternion<f64>> {
        let oldest = self.ring.oldest()?;
        let latest = self.ring.latest()?;

        if timestamp_ns <= oldest.timestamp_ns {
            return Some(oldest.value);
        }
        if timestamp_ns >= latest.timestamp_ns {
            return Some(latest.value);
        }

        self.ring
            .pairs()
            .find(|(a, b)| a.timestamp_ns <= timestamp_ns && timestamp_ns <= b.timestamp_ns)
            .map(|(a, b)| {
                let span = b.timestamp_ns.saturating_sub(a.timestamp_ns);
                if span <= 0 {
                    return b.value;
                }
                let t = timestamp_ns.saturating_sub(a.timestamp_ns) as f64 / span as f64;
                a.value.try_slerp(&b.value, t, 1e-9).unwrap_or(b.value)
            })
            .or(Some(latest.value))
    }
}

/// Absolute position history from the 6DOF source.
#[derive(Debug, Clone)]
pub struct PositionData {
    ring: TimedRing<Vector3<f64>>,
}

impl PositionData {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: TimedRing::new(capacity),
        }
    }

    pub fn add_sample(&mut self, position: Vector3<f64>, timestamp_ns: i64) {
        self.ring.push(position, timestamp_ns);
    }

    /// True once the buffer has filled to capacity.
    pub fn is_valid(&self) -> bool {
        self.ring.is_full()
    }

    pub fn latest_timestamp(&self) -> Option<i64> {
        self.ring.latest().map(|s| s.timestamp_ns)
    }

    pub fn latest_data(&self) -> Option<Vector3<f64>> {
        self.ring.latest().map(|s| s.value)
    }

    /// Position at `timestamp_ns`, extrapolated linearly from the latest sample
    /// using the mean velocity across the stored window.
    pub fn extrapolated_for_timestamp(&self, timestamp_ns: i64) -> Option<Vector3<f64>> {
        let oldest = self.ring.oldest()?;
        let latest = self.ring.latest()?;

        let span = latest.timestamp_ns.saturating_sub(oldest.timestamp_ns);
        if span <= 0 {
            return Some(latest.value);
        }

        let velocity = (latest.value - oldest.value) / span as f64;
        let ahead = timestamp_ns.saturating_sub(latest.timestamp_ns) as f64;
        Some(latest.value + velocity * ahead)
    }
}
