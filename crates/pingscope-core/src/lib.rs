//! Sonar design model and processing-unit contract.
//!
//! # Primary API
//!
//! - [`SonarSettings`]: user knobs
//! - [`derive`] / [`DerivedParameters`]: pure parameter model
//! - [`SignalSynthesis`] / [`ChirpSynthesizer`]: transmit pulse and slow-time window
//! - [`ProcessingUnit`] / [`CapturePort`]: the real-time numeric engine seam
//! - [`InitPayload`] / [`RuntimeMessage`]: the unit's message contract
//!
//! # Example
//!
//! ```
//! use pingscope_core::{derive, DesignConstants, SonarSettings};
//!
//! let settings = SonarSettings::default().with_slow_pulse_count(21);
//! let derived = derive(&settings, &DesignConstants::default());
//! assert_eq!(derived.fast_bins, 64);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod settings;
pub use settings::{ClutterFilterMode, KnobRange, SonarSettings};

pub mod params;
pub use params::{derive, DerivedParameters, DesignConstants, Readout};

pub mod synthesis;
pub use synthesis::{ChirpSynthesizer, SignalSynthesis};

mod message;
pub use message::{InitPayload, ModuleBytes, RuntimeMessage};

mod module;
pub use module::ModuleSource;

pub mod unit;
pub use unit::{
    message_channel, CapturePort, MessageHandler, MessagePort, ProcessingUnit, Subscription,
    UnitOutbox,
};

mod lockfree;
pub use lockfree::AtomicFloat;
