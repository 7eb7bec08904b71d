//! Error types for pingscope-core.

use thiserror::Error;

/// Error type shared by every pingscope subsystem.
#[derive(Error, Debug)]
pub enum Error {
    /// Output or input device could not be opened (no device, consent denied).
    #[error("Audio device unavailable: {0}")]
    DeviceAcquisition(String),

    /// Processing module could not be fetched or instantiated.
    #[error("Processing module failed to load: {0}")]
    ModuleLoad(String),

    #[error("Audio session is already running")]
    AlreadyRunning,

    #[error("Not initialized")]
    NotInitialized,

    #[error("Audio session has been closed")]
    SessionClosed,

    #[error("Frame length {actual} does not match display size {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Display surface error: {0}")]
    Display(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// Wrap any displayable backend error as a device acquisition failure.
    pub fn device(err: impl core::fmt::Display) -> Self {
        Self::DeviceAcquisition(err.to_string())
    }

    /// Whether the caller may simply invoke `start()` again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeviceAcquisition(_) | Self::ModuleLoad(_))
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
