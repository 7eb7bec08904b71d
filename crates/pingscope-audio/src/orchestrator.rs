//! Session lifecycle: devices, one-time unit configuration, message relay.

use crate::session::{SessionEvent, SessionFsm, SessionState, Transition};
use crate::{AudioBackend, CaptureConstraints, InputSource, OutputRequest, OutputSink, SecondChannel};
use parking_lot::Mutex;
use pingscope_core::{
    derive, DerivedParameters, DesignConstants, Error, InitPayload, MessageHandler, ModuleSource,
    ProcessingUnit, Result, RuntimeMessage, SignalSynthesis, SonarSettings, Subscription,
};
use std::sync::Arc;

/// Configuration for one audio session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionConfig {
    pub settings: SonarSettings,
    pub constants: DesignConstants,
    pub module: ModuleSource,
    pub second_channel: SecondChannel,
}

impl SessionConfig {
    pub fn new(settings: SonarSettings, constants: DesignConstants) -> Self {
        Self {
            settings,
            constants,
            ..Default::default()
        }
    }

    pub fn with_module(mut self, module: ModuleSource) -> Self {
        self.module = module;
        self
    }

    pub fn with_second_channel(mut self, second_channel: SecondChannel) -> Self {
        self.second_channel = second_channel;
        self
    }
}

type HandlerSlot = Arc<Mutex<Option<MessageHandler>>>;

/// Handles held while a session is live. Dropping releases the devices.
struct ActiveSession {
    // Input first: the capture port must stop before the output it hears.
    input: Box<dyn InputSource>,
    output: Box<dyn OutputSink>,
    _subscription: Subscription,
    derived: DerivedParameters,
    config: SessionConfig,
}

/// Owns the audio session and is its only mutator.
///
/// `start()` and `stop()` block until the devices respond. Runtime messages
/// are delivered by [`pump`](Self::pump) on the caller's thread.
pub struct AudioGraphOrchestrator {
    backend: Box<dyn AudioBackend>,
    unit: Box<dyn ProcessingUnit>,
    synthesis: Arc<dyn SignalSynthesis>,
    fsm: SessionFsm,
    handler: HandlerSlot,
    session: Option<ActiveSession>,
}

impl AudioGraphOrchestrator {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        unit: Box<dyn ProcessingUnit>,
        synthesis: Arc<dyn SignalSynthesis>,
    ) -> Self {
        Self {
            backend,
            unit,
            synthesis,
            fsm: SessionFsm::new(),
            handler: Arc::new(Mutex::new(None)),
            session: None,
        }
    }

    /// Register the single recipient of runtime messages, replacing any
    /// previous one. Takes effect immediately, also mid-session.
    pub fn set_message_handler(&mut self, handler: impl FnMut(RuntimeMessage) + Send + 'static) {
        *self.handler.lock() = Some(Box::new(handler));
    }

    pub fn state(&self) -> SessionState {
        self.fsm.state()
    }

    pub fn is_running(&self) -> bool {
        self.fsm.state() == SessionState::Running
    }

    /// Parameters the current session was configured with.
    pub fn derived(&self) -> Option<&DerivedParameters> {
        self.session.as_ref().map(|s| &s.derived)
    }

    /// Configuration the current session was opened with.
    pub fn session_config(&self) -> Option<&SessionConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    pub fn sessions_opened(&self) -> u64 {
        self.fsm.sessions_opened()
    }

    /// Messages the unit dropped because the relay fell behind.
    pub fn dropped_messages(&self) -> u64 {
        self.unit.dropped_messages()
    }

    /// Open a session, or resume a suspended one.
    ///
    /// Returns the parameters the session runs with. They differ from
    /// `derive(config)` only when the output device granted another sample
    /// rate. Resuming keeps the session's original configuration.
    pub fn start(&mut self, config: &SessionConfig) -> Result<DerivedParameters> {
        match self.fsm.transition(SessionEvent::Start)? {
            Transition::Acquire => self.open_session(config),
            Transition::Resume => self.resume(config),
            other => Err(Error::InvalidConfig(format!(
                "unexpected transition {other:?} on start"
            ))),
        }
    }

    /// Pause both streams in place. A second `stop()` is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if self.fsm.transition(SessionEvent::Stop)? != Transition::Suspend {
            return Ok(());
        }

        let Some(session) = self.session.as_mut() else {
            return Err(Error::NotInitialized);
        };
        let input = session.input.pause();
        let output = session.output.pause();
        tracing::info!("audio session suspended");
        input.and(output)
    }

    /// Release every device. A later `start()` opens a new session.
    pub fn close(&mut self) {
        match self.fsm.transition(SessionEvent::Close) {
            Ok(Transition::Release) | Ok(Transition::Abort) => {
                self.session = None;
                tracing::info!("audio session closed");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "close failed"),
        }
    }

    /// Forward every pending runtime message to the handler, in order.
    /// Does nothing unless the session is running.
    pub fn pump(&mut self) -> usize {
        if !self.is_running() {
            return 0;
        }
        self.unit.dispatch()
    }

    fn open_session(&mut self, config: &SessionConfig) -> Result<DerivedParameters> {
        tracing::info!(
            center_hz = config.settings.center_frequency_hz,
            pulses = config.settings.slow_pulse_count,
            "starting audio session"
        );

        match self.acquire(config) {
            Ok(session) => {
                let derived = session.derived;
                self.session = Some(session);
                self.fsm.transition(SessionEvent::Ready)?;
                tracing::info!(
                    fast_bins = derived.fast_bins,
                    decimation = derived.decimation_factor,
                    "audio session running"
                );
                Ok(derived)
            }
            Err(e) => {
                // Partially opened handles were dropped inside acquire()
                self.fsm.transition(SessionEvent::Fail)?;
                tracing::error!(error = %e, "audio session failed to start");
                Err(e)
            }
        }
    }

    fn acquire(&mut self, config: &SessionConfig) -> Result<ActiveSession> {
        config.settings.validate()?;
        config.constants.validate()?;

        let preferred = config.constants.sample_rate.round() as u32;
        let sample_rate = self.backend.negotiate_sample_rate(preferred)?;
        let constants = if sample_rate == preferred {
            config.constants
        } else {
            tracing::warn!(preferred, granted = sample_rate, "device sample rate differs");
            let constants = config.constants.with_sample_rate(sample_rate as f64);
            constants.validate()?;
            constants
        };
        let derived = derive(&config.settings, &constants);
        let carrier = derived.normalized_carrier();
        if !(carrier > 0.0 && carrier < 0.5) {
            return Err(Error::InvalidSettings(format!(
                "center frequency {} Hz is not below Nyquist at {sample_rate} Hz",
                config.settings.center_frequency_hz
            )));
        }

        let waveform: Arc<[f32]> = self
            .synthesis
            .transmit_waveform(&config.settings, &derived)
            .into();
        let window: Arc<[f32]> = self
            .synthesis
            .slow_time_window(&config.settings, &derived)
            .into();
        if waveform.len() != derived.chirp_length_samples {
            return Err(Error::DimensionMismatch {
                expected: derived.chirp_length_samples,
                actual: waveform.len(),
            });
        }
        if window.len() != derived.slow_pulse_count {
            return Err(Error::DimensionMismatch {
                expected: derived.slow_pulse_count,
                actual: window.len(),
            });
        }

        // (a) transmit loop
        let output = self.backend.open_output(OutputRequest {
            waveform: Arc::clone(&waveform),
            sample_rate,
            second_channel: config.second_channel,
        })?;

        // (b) one-time unit configuration
        let module_bytes = config.module.load()?;
        let payload = InitPayload::new(
            module_bytes,
            waveform,
            window,
            &config.settings,
            &derived,
            &constants,
        );
        tracing::debug!(
            carrier = payload.normalized_carrier,
            clutter_alpha = payload.clutter_alpha,
            "configuring processing unit"
        );
        let port = self.unit.configure(payload)?;

        // (c) microphone, feeding only the unit
        let input = self
            .backend
            .open_input(&CaptureConstraints::raw_stereo(sample_rate), port)?;

        // (d) relay
        let slot = Arc::clone(&self.handler);
        let subscription = self.unit.subscribe(Box::new(move |message| {
            if let Some(handler) = slot.lock().as_mut() {
                handler(message);
            }
        }));
        if self.handler.lock().is_none() {
            tracing::warn!("no message handler registered; frames will be discarded");
        }

        Ok(ActiveSession {
            input,
            output,
            _subscription: subscription,
            derived,
            config: config.clone(),
        })
    }

    fn resume(&mut self, config: &SessionConfig) -> Result<DerivedParameters> {
        let Some(session) = self.session.as_mut() else {
            return Err(Error::NotInitialized);
        };
        if session.config != *config {
            tracing::debug!("resuming with the session's original configuration");
        }

        self.unit.restart();
        let resumed = session
            .output
            .resume()
            .and_then(|_| session.input.resume());
        if let Err(e) = resumed {
            let _ = session.input.pause();
            let _ = session.output.pause();
            self.fsm.transition(SessionEvent::Stop)?;
            tracing::error!(error = %e, "audio session failed to resume");
            return Err(e);
        }

        tracing::info!("audio session resumed");
        Ok(session.derived)
    }
}

impl Drop for AudioGraphOrchestrator {
    fn drop(&mut self) {
        self.close();
    }
}
