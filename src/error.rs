//! Centralized error type for the pingscope umbrella crate.
//!
//! Wraps subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] pingscope_core::Error),

    #[error("config serialization: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The core error underneath, if any.
    pub fn core(&self) -> Option<&pingscope_core::Error> {
        match self {
            Self::Core(e) => Some(e),
            _ => None,
        }
    }

    /// Device or module failures; the caller may try `start()` again.
    pub fn is_retryable(&self) -> bool {
        self.core().is_some_and(|e| e.is_retryable())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
