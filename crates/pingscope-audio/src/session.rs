//! Audio session state machine.
//!
//! Transitions are pure data: the orchestrator feeds events in and acts on
//! the returned [`Transition`]; nothing here touches a device.

use pingscope_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initializing,
    Running,
    Suspended,
    Closed,
}

impl SessionState {
    /// Devices are held in these states.
    pub fn holds_devices(&self) -> bool {
        matches!(self, Self::Running | Self::Suspended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    /// Acquisition and configuration finished.
    Ready,
    /// Acquisition or configuration failed.
    Fail,
    Stop,
    Close,
}

/// What the orchestrator must do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Open devices and configure the unit for a new session.
    Acquire,
    /// Resume suspended devices.
    Resume,
    /// Pause devices in place.
    Suspend,
    /// Session is live.
    Started,
    /// Drop partially acquired handles; back to `Uninitialized`.
    Abort,
    /// Release every handle.
    Release,
}

#[derive(Debug, Default)]
pub struct SessionFsm {
    state: SessionState,
    sessions_opened: u64,
}

impl SessionFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of sessions that reached `Running` at least once.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened
    }

    pub fn transition(&mut self, event: SessionEvent) -> Result<Transition> {
        use SessionEvent::*;
        use SessionState::*;

        let (next, transition) = match (event, self.state) {
            (Start, Uninitialized | Closed) => (Initializing, Transition::Acquire),
            (Start, Suspended) => (Running, Transition::Resume),
            (Start, Running | Initializing) => return Err(Error::AlreadyRunning),

            (Ready, Initializing) => {
                self.sessions_opened += 1;
                (Running, Transition::Started)
            }
            (Ready, _) => return Err(Error::NotInitialized),

            (Fail, Initializing) => (Uninitialized, Transition::Abort),
            (Fail, state) => (state, Transition::None),

            (Stop, Running) => (Suspended, Transition::Suspend),
            (Stop, Suspended) => (Suspended, Transition::None),
            (Stop, Uninitialized | Initializing) => return Err(Error::NotInitialized),
            (Stop, Closed) => return Err(Error::SessionClosed),

            (Close, Running | Suspended) => (Closed, Transition::Release),
            (Close, Initializing) => (Closed, Transition::Abort),
            (Close, Uninitialized | Closed) => (Closed, Transition::None),
        };

        self.state = next;
        Ok(transition)
    }
}
