//! Error handling for the sound layer
//!
//! Engine operations never hand these errors back to the game: they are
//! logged and kept as [`Diagnostic`] records. Lower-level pieces (decoding,
//! export, configuration) return them normally.

use std::fmt;

use thiserror::Error;

/// Result type alias for sound operations
pub type Result<T> = std::result::Result<T, SoundError>;

/// Main error type for sound operations
#[derive(Error, Debug)]
pub enum SoundError {
    // Device Errors
    #[error("Audio device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    #[error("Audio device error: {reason}")]
    DeviceError { reason: String },

    // Load Errors
    #[error("Sample not found: {uri}")]
    SampleNotFound {
        uri: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Failed to fetch sample '{uri}'")]
    FetchFailed {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode sample '{name}': {reason}")]
    DecodeFailed {
        name: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Sample contains no audio: {name}")]
    EmptySample { name: String },

    #[error("Load of '{name}' was aborted")]
    LoadAborted { name: String },

    // Teardown Errors
    #[error("Unknown bus: {bus}")]
    UnknownBus { bus: u64 },

    // Parameter Errors
    #[error("Invalid tempo: {bpm} BPM")]
    InvalidTempo { bpm: f64 },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure classes of the sound layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Platform has no usable audio output
    DeviceUnavailable,
    /// Sample could not be fetched or decoded
    LoadFailure,
    /// Releasing a bus or timer failed
    Teardown,
    /// Caller passed an unusable parameter
    InvalidInput,
    /// Anything else (I/O, serialization)
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::DeviceUnavailable => write!(f, "device-unavailable"),
            ErrorCategory::LoadFailure => write!(f, "load-failure"),
            ErrorCategory::Teardown => write!(f, "teardown"),
            ErrorCategory::InvalidInput => write!(f, "invalid-input"),
            ErrorCategory::Other => write!(f, "other"),
        }
    }
}

impl SoundError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SoundError::DeviceUnavailable { .. } => "DEVICE_UNAVAILABLE",
            SoundError::DeviceError { .. } => "DEVICE_ERROR",
            SoundError::SampleNotFound { .. } => "SAMPLE_NOT_FOUND",
            SoundError::FetchFailed { .. } => "FETCH_FAILED",
            SoundError::DecodeFailed { .. } => "DECODE_FAILED",
            SoundError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SoundError::EmptySample { .. } => "EMPTY_SAMPLE",
            SoundError::LoadAborted { .. } => "LOAD_ABORTED",
            SoundError::UnknownBus { .. } => "UNKNOWN_BUS",
            SoundError::InvalidTempo { .. } => "INVALID_TEMPO",
            SoundError::InvalidConfig { .. } => "INVALID_CONFIG",
            SoundError::Io(_) => "IO_ERROR",
            SoundError::Wav(_) => "WAV_ERROR",
            SoundError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Which failure class this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            SoundError::DeviceUnavailable { .. } | SoundError::DeviceError { .. } => {
                ErrorCategory::DeviceUnavailable
            }
            SoundError::SampleNotFound { .. }
            | SoundError::FetchFailed { .. }
            | SoundError::DecodeFailed { .. }
            | SoundError::UnsupportedFormat { .. }
            | SoundError::EmptySample { .. }
            | SoundError::LoadAborted { .. } => ErrorCategory::LoadFailure,
            SoundError::UnknownBus { .. } => ErrorCategory::Teardown,
            SoundError::InvalidTempo { .. } | SoundError::InvalidConfig { .. } => {
                ErrorCategory::InvalidInput
            }
            SoundError::Io(_) | SoundError::Wav(_) | SoundError::Serialization(_) => {
                ErrorCategory::Other
            }
        }
    }
}

/// A recorded, non-fatal failure
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&SoundError> for Diagnostic {
    fn from(err: &SoundError) -> Self {
        Self {
            code: err.error_code(),
            category: err.category(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
