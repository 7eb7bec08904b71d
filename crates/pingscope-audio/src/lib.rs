//! Audio session orchestration for pingscope.
//!
//! [`AudioGraphOrchestrator`] owns one session at a time: it loops the
//! transmit pulse on the output device, configures the processing unit once,
//! routes the microphone into it and relays the unit's messages back to the
//! control thread.
//!
//! Devices sit behind [`AudioBackend`]; enable the `cpal` feature (default)
//! for [`CpalBackend`].

pub mod session;
pub use session::{SessionEvent, SessionFsm, SessionState, Transition};

mod device;
pub use device::{
    AudioBackend, CaptureConstraints, InputSource, OutputRequest, OutputSink, SecondChannel,
};

mod loop_player;
pub use loop_player::LoopPlayer;

mod orchestrator;
pub use orchestrator::{AudioGraphOrchestrator, SessionConfig};

#[cfg(feature = "cpal")]
mod cpal_backend;
#[cfg(feature = "cpal")]
pub use cpal_backend::CpalBackend;

pub use pingscope_core::{Error, Result};
