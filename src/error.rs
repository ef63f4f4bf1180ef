use std::fmt;

/// Errors that can occur outside the pose pipeline.
///
/// Pose queries and sample ingestion never fail; they degrade to fallback
/// output instead. These variants cover sensor plumbing and the C boundary.
#[derive(Debug, thiserror::Error)]
pub enum HeadTrackerError {
    #[error("Failed to spawn sensor thread '{name}': {source}")]
    SensorThread {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sensor channel disconnected")]
    ChannelDisconnected,

    #[error("Invalid viewport orientation: {0} (expected 0..=3)")]
    InvalidViewport(i32),

    #[error("Null pointer passed for '{0}'")]
    NullPointer(&'static str),
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &HeadTrackerError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
