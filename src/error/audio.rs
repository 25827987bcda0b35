// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Single source of truth for the numeric codes carried by diagnostic
/// entries and CLI output.
///
/// Error code range: 1101-1108
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// The source could not be read or is not reachable from this backend
    pub const SOURCE_UNAVAILABLE: i32 = 1101;

    /// The source was read but could not be decoded
    pub const UNSUPPORTED_FORMAT: i32 = 1102;

    /// No output device matches the requested sink id
    pub const DEVICE_NOT_FOUND: i32 = 1103;

    /// The backend rejected a sink (output device) change
    pub const SINK_SELECTION_FAILED: i32 = 1104;

    /// Failed to open audio stream
    pub const STREAM_OPEN_FAILED: i32 = 1105;

    /// Hardware or host error occurred
    pub const HARDWARE_ERROR: i32 = 1106;

    /// The element was dropped before an asynchronous request completed
    pub const ELEMENT_RELEASED: i32 = 1107;

    /// A completion task could not be scheduled
    pub const SPAWN_FAILED: i32 = 1108;
}

/// Log an audio error with structured context
///
/// Non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioElement, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover source loading, output stream management and sink
/// selection. None of them cross the public boundary of the playback
/// controller; they surface through backend constructors and the
/// diagnostic channel.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Source could not be opened (missing file, remote URL, ...)
    SourceUnavailable { source: String, reason: String },

    /// Source bytes are not a supported format
    UnsupportedFormat { reason: String },

    /// No output device with the requested id
    DeviceNotFound { device_id: String },

    /// Backend rejected the sink change
    SinkSelectionFailed { device_id: String, reason: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Hardware error occurred
    HardwareError { details: String },

    /// Element dropped while a request was in flight
    ElementReleased,

    /// Executor refused the completion task
    SpawnFailed { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::SourceUnavailable { .. } => AudioErrorCodes::SOURCE_UNAVAILABLE,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::DeviceNotFound { .. } => AudioErrorCodes::DEVICE_NOT_FOUND,
            AudioError::SinkSelectionFailed { .. } => AudioErrorCodes::SINK_SELECTION_FAILED,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::ElementReleased => AudioErrorCodes::ELEMENT_RELEASED,
            AudioError::SpawnFailed { .. } => AudioErrorCodes::SPAWN_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::SourceUnavailable { source, reason } => {
                format!("Source {} unavailable: {}", source, reason)
            }
            AudioError::UnsupportedFormat { reason } => {
                format!("Unsupported media format: {}", reason)
            }
            AudioError::DeviceNotFound { device_id } => {
                format!("No output device named '{}'", device_id)
            }
            AudioError::SinkSelectionFailed { device_id, reason } => {
                format!("Failed to set sink '{}': {}", device_id, reason)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::ElementReleased => {
                "Audio element was released before the request completed".to_string()
            }
            AudioError::SpawnFailed { reason } => {
                format!("Failed to schedule completion task: {}", reason)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => AudioError::SourceUnavailable {
                source: "wav".to_string(),
                reason: io.to_string(),
            },
            other => AudioError::UnsupportedFormat {
                reason: other.to_string(),
            },
        }
    }
}
