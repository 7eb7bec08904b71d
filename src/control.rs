//! User-facing settings object wired to the audio session and display.

use crate::{ControlSurfaceBuilder, Result};
use parking_lot::{Mutex, MutexGuard};
use pingscope_audio::{AudioGraphOrchestrator, SessionConfig, SessionState};
use pingscope_core::{derive, AtomicFloat, DerivedParameters, Readout, RuntimeMessage, SonarSettings};
use pingscope_render::{DisplaySurface, RangeDopplerRenderer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Renderer as shared between the control surface and the message relay.
pub type SharedRenderer = Arc<Mutex<RangeDopplerRenderer<Box<dyn DisplaySurface + Send>>>>;

/// Values the relay publishes for the UI.
#[derive(Debug, Default)]
struct Telemetry {
    peak: AtomicFloat,
    last_max: AtomicFloat,
    frames: AtomicU64,
    rejected: AtomicU64,
}

/// Owns the settings, the orchestrator and the renderer.
///
/// Settings changes always recompute [`DerivedParameters`] and the readout.
/// While a session holds devices the change is deferred: the next `start()`
/// after a `stop()` closes the old session and opens one with the new
/// configuration, resizing the renderer to match.
pub struct ControlSurface {
    config: SessionConfig,
    derived: DerivedParameters,
    pending_reconfigure: bool,
    orchestrator: AudioGraphOrchestrator,
    renderer: SharedRenderer,
    telemetry: Arc<Telemetry>,
}

impl ControlSurface {
    pub fn builder() -> ControlSurfaceBuilder {
        ControlSurfaceBuilder::default()
    }

    pub(crate) fn from_parts(
        config: SessionConfig,
        mut orchestrator: AudioGraphOrchestrator,
        renderer: SharedRenderer,
    ) -> Self {
        let telemetry = Arc::new(Telemetry::default());
        orchestrator.set_message_handler(relay(Arc::clone(&renderer), Arc::clone(&telemetry)));

        let derived = derive(&config.settings, &config.constants);
        renderer.lock().resize(derived.fast_bins, derived.slow_pulse_count);

        Self {
            config,
            derived,
            pending_reconfigure: false,
            orchestrator,
            renderer,
            telemetry,
        }
    }

    pub fn settings(&self) -> &SonarSettings {
        &self.config.settings
    }

    /// Parameters of the latest settings, not necessarily of the running session.
    pub fn derived(&self) -> &DerivedParameters {
        &self.derived
    }

    /// Parameters the current session runs with.
    pub fn session_derived(&self) -> Option<&DerivedParameters> {
        self.orchestrator.derived()
    }

    pub fn readout(&self) -> Vec<Readout> {
        self.derived.readout()
    }

    pub fn state(&self) -> SessionState {
        self.orchestrator.state()
    }

    /// A settings change is waiting for the next stop/start cycle.
    pub fn is_reconfigure_pending(&self) -> bool {
        self.pending_reconfigure
    }

    /// Validate and adopt new settings.
    pub fn apply_settings(&mut self, settings: SonarSettings) -> Result<&DerivedParameters> {
        settings.validate()?;
        if settings == self.config.settings {
            return Ok(&self.derived);
        }

        self.config.settings = settings;
        self.derived = derive(&settings, &self.config.constants);

        if self.orchestrator.state().holds_devices() {
            self.pending_reconfigure = true;
            tracing::info!("settings changed; applied at next stop/start");
        } else {
            self.renderer
                .lock()
                .resize(self.derived.fast_bins, self.derived.slow_pulse_count);
        }
        Ok(&self.derived)
    }

    /// Start a session, resume a suspended one, or replace a suspended one
    /// whose configuration went stale.
    pub fn start(&mut self) -> Result<DerivedParameters> {
        if self.pending_reconfigure && self.orchestrator.state() == SessionState::Suspended {
            tracing::info!("closing stale session");
            self.orchestrator.close();
        }

        let resuming = self.orchestrator.state() == SessionState::Suspended;
        let session = self.orchestrator.start(&self.config)?;
        if !resuming {
            self.pending_reconfigure = false;
            self.renderer
                .lock()
                .resize(session.fast_bins, session.slow_pulse_count);
        }
        Ok(session)
    }

    pub fn stop(&mut self) -> Result<()> {
        Ok(self.orchestrator.stop()?)
    }

    /// Release all devices.
    pub fn close(&mut self) {
        self.orchestrator.close();
        if self.pending_reconfigure {
            self.pending_reconfigure = false;
            self.renderer
                .lock()
                .resize(self.derived.fast_bins, self.derived.slow_pulse_count);
        }
    }

    /// Deliver pending runtime messages to the renderer and level meter.
    /// Call regularly from the control thread.
    pub fn pump(&mut self) -> usize {
        self.orchestrator.pump()
    }

    /// Latest input peak level in [0, 1].
    pub fn peak_level(&self) -> f32 {
        self.telemetry.peak.get()
    }

    /// Maximum magnitude of the last drawn frame.
    pub fn last_frame_max(&self) -> f32 {
        self.telemetry.last_max.get()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.telemetry.frames.load(Ordering::Relaxed)
    }

    /// Frames the renderer refused (wrong size or display failure).
    pub fn frames_rejected(&self) -> u64 {
        self.telemetry.rejected.load(Ordering::Relaxed)
    }

    pub fn dropped_messages(&self) -> u64 {
        self.orchestrator.dropped_messages()
    }

    pub fn renderer(&self) -> MutexGuard<'_, RangeDopplerRenderer<Box<dyn DisplaySurface + Send>>> {
        self.renderer.lock()
    }
}

/// The single message handler: frames to the renderer, peaks to the meter.
fn relay(
    renderer: SharedRenderer,
    telemetry: Arc<Telemetry>,
) -> impl FnMut(RuntimeMessage) + Send + 'static {
    move |message| {
        if let Some(level) = message.peak {
            telemetry.peak.set(level);
        }
        if let Some(frame) = message.fast_slow {
            match renderer.lock().draw(&frame) {
                Ok(max) => {
                    telemetry.last_max.set(max);
                    telemetry.frames.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    telemetry.rejected.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "range-Doppler frame dropped");
                }
            }
        }
    }
}
