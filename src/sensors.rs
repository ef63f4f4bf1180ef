use crate::types::{AccelerometerData, GyroscopeData};
use crate::{HeadTrackerError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked once per delivered sample.
pub type SensorCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Push-style source of sensor samples.
pub trait SensorSource<T>: Send + Sync {
    /// Start delivering samples to `callback`. Samples queued while stopped
    /// are discarded. Calling this while already polling keeps the existing
    /// callback.
    fn start_polling(&mut self, callback: SensorCallback<T>) -> Result<()>;

    /// Stop delivering samples. When this returns, the callback will not be
    /// invoked again until the next `start_polling`.
    fn stop_polling(&mut self);

    fn is_polling(&self) -> bool;
}

/// Channel-backed sensor source.
///
/// Platform code pushes samples into a bounded channel; while polling, a
/// background thread drains it and invokes the registered callback.
pub struct SensorEventProducer<T> {
    name: String,
    receiver: Receiver<T>,
    poll_timeout: Duration,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl<T: Send + 'static> SensorEventProducer<T> {
    pub fn new(name: impl Into<String>, receiver: Receiver<T>, poll_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            receiver,
            poll_timeout,
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Create a producer together with the sender platform code feeds.
    pub fn with_channel(
        name: impl Into<String>,
        capacity: usize,
        poll_timeout: Duration,
    ) -> (Sender<T>, Self) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (sender, Self::new(name, receiver, poll_timeout))
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("Sensor thread '{}' panicked", self.name);
            }
            log::debug!("Sensor thread '{}' stopped", self.name);
        }
    }
}

impl<T: Send + 'static> SensorSource<T> for SensorEventProducer<T> {
    fn start_polling(&mut self, callback: SensorCallback<T>) -> Result<()> {
        if self.thread.is_some() {
            log::debug!("Sensor '{}' already polling", self.name);
            return Ok(());
        }

        // Samples queued while stopped belong to the stopped period.
        let stale = self.receiver.try_iter().count();
        if stale > 0 {
            log::debug!("Sensor '{}' discarded {} queued samples", self.name, stale);
        }

        // Fresh flag per run so a stale stop request cannot leak into this one.
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();
        let receiver = self.receiver.clone();
        let poll_timeout = self.poll_timeout;

        let thread = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                sensor_poll_loop(receiver, callback, stop_clone, poll_timeout);
            })
            .map_err(|source| HeadTrackerError::SensorThread {
                name: self.name.clone(),
                source,
            })?;

        self.stop_flag = stop_flag;
        self.thread = Some(thread);
        Ok(())
    }

    fn stop_polling(&mut self) {
        self.shutdown();
    }

    fn is_polling(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
            && !self.stop_flag.load(Ordering::Relaxed)
    }
}

impl<T> Drop for SensorEventProducer<T> {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Drains the sample channel in a dedicated thread.
///
/// Blocks for at most `poll_timeout` per iteration so the stop flag is
/// observed promptly.
fn sensor_poll_loop<T>(
    receiver: Receiver<T>,
    callback: SensorCallback<T>,
    stop_flag: Arc<AtomicBool>,
    poll_timeout: Duration,
) {
    log::info!(
        "Sensor poller started ({})",
        std::thread::current().name().unwrap_or("unnamed")
    );

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            break;
        }

        match receiver.recv_timeout(poll_timeout) {
            Ok(sample) => callback(&sample),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                log::info!("Sensor channel disconnected, stopping poller");
                break;
            }
        }
    }
}

/// Senders feeding a tracker's accelerometer and gyroscope sources.
#[derive(Clone)]
pub struct SensorFeeds {
    pub accelerometer: Sender<AccelerometerData>,
    pub gyroscope: Sender<GyroscopeData>,
}

impl SensorFeeds {
    /// Queue an accelerometer sample. A full queue drops the sample.
    pub fn push_accelerometer(&self, sample: AccelerometerData) -> Result<()> {
        push(&self.accelerometer, sample, "accelerometer")
    }

    /// Queue a gyroscope sample. A full queue drops the sample.
    pub fn push_gyroscope(&self, sample: GyroscopeData) -> Result<()> {
        push(&self.gyroscope, sample, "gyroscope")
    }
}

fn push<T>(sender: &Sender<T>, sample: T, kind: &str) -> Result<()> {
    match sender.try_send(sample) {
        Ok(()) => Ok(()),
        Err(crossbeam_channel::TrySendError::Full(_)) => {
            log::trace!("{} channel full, dropping sample", kind);
            Ok(())
        }
        Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
            Err(HeadTrackerError::ChannelDisconnected)
        }
    }
}
