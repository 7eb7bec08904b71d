//! # Pingscope - Interactive Pulse-Doppler Sonar
//!
//! Turns a speaker and a microphone into a pulse-Doppler sonar and shows the
//! resulting range-Doppler map.
//!
//! ## Architecture
//!
//! Pingscope is an umbrella crate that coordinates:
//! - **pingscope-core** - Settings, parameter model, pulse synthesis, processing-unit contract
//! - **pingscope-audio** - Session state machine, device backends (CPAL), orchestrator
//! - **pingscope-dsp** - Real-time pulse-Doppler processing unit
//! - **pingscope-render** - Range-Doppler pixel buffer and display surfaces
//!
//! ## Quick Start
//!
//! ```ignore
//! use pingscope::prelude::*;
//!
//! let mut sonar = ControlSurface::builder()
//!     .settings(SonarSettings::default().with_clutter_filter(ClutterFilterMode::TwoPulseCanceller))
//!     .build()?;
//!
//! for r in sonar.readout() {
//!     println!("{}: {}", r.label, r.value);
//! }
//!
//! sonar.start()?;
//! loop {
//!     sonar.pump();
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `cpal` and `png`
//! - `cpal` - Hardware audio through CPAL
//! - `png` - PNG snapshots of the range-Doppler map

/// Re-export of pingscope-core for direct access
pub use pingscope_core as core;
pub use pingscope_audio as audio;
pub use pingscope_dsp as dsp;
pub use pingscope_render as render;

pub use pingscope_core::{
    derive, ChirpSynthesizer, ClutterFilterMode, DerivedParameters, DesignConstants, InitPayload,
    ModuleSource, ProcessingUnit, Readout, RuntimeMessage, SignalSynthesis, SonarSettings,
};

pub use pingscope_audio::{AudioBackend, AudioGraphOrchestrator, SessionConfig, SessionState};

#[cfg(feature = "cpal")]
pub use pingscope_audio::CpalBackend;

pub use pingscope_dsp::PulseDopplerUnit;

pub use pingscope_render::{DisplaySurface, IntensityChannel, PixelBuffer, RangeDopplerRenderer};

#[cfg(feature = "png")]
pub use pingscope_render::PngSurface;

mod error;
pub use error::{Error, Result};

mod config;
pub use config::{AudioConfig, PingscopeConfig, RenderConfig};

mod builder;
pub use builder::ControlSurfaceBuilder;

mod control;
pub use control::{ControlSurface, SharedRenderer};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{ControlSurface, ControlSurfaceBuilder, PingscopeConfig};

    pub use crate::core::{ClutterFilterMode, DerivedParameters, DesignConstants, SonarSettings};

    pub use crate::audio::SessionState;

    pub use crate::render::{DisplaySurface, IntensityChannel};

    #[cfg(feature = "cpal")]
    pub use crate::audio::CpalBackend;

    #[cfg(feature = "png")]
    pub use crate::render::PngSurface;
}
