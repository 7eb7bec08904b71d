//! Test helpers and fixtures for pingscope integration tests
//!
//! [`LoopbackBackend`] stands in for the sound card: it records what the
//! orchestrator opens and lets a test push capture buffers straight into the
//! processing unit, with a manual cycle instead of a real-time callback.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations
//! - `DSP_EPSILON` (1e-4): DSP processing
//! - `PARAM_EPSILON` (1e-9): Parameter model arithmetic

#![allow(dead_code)]


use parking_lot::Mutex;
use pingscope::audio::{CaptureConstraints, InputSource, OutputRequest, OutputSink};
use pingscope::core::{CapturePort, Error, Result};
use pingscope::prelude::*;
use pingscope::{AudioBackend, ControlSurfaceBuilder};
use pingscope::render::SnapshotSurface;
use std::sync::Arc;

/// Failure injected into the next matching open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Output,
    Input,
}

#[derive(Default)]
pub struct LoopbackState {
    pub outputs_opened: usize,
    pub inputs_opened: usize,
    pub released: usize,
    pub pauses: usize,
    pub resumes: usize,
    pub last_request: Option<OutputRequest>,
    pub last_constraints: Option<CaptureConstraints>,
    pub fault: Option<Fault>,
    /// Rate granted regardless of the one asked for
    pub granted_rate: Option<u32>,
    port: Option<Box<dyn CapturePort>>,
    capturing: bool,
}

impl LoopbackState {
    pub fn live_streams(&self) -> usize {
        self.outputs_opened + self.inputs_opened - self.released
    }
}

/// Shared view of a [`LoopbackBackend`], kept by the test.
#[derive(Clone, Default)]
pub struct Loopback(Arc<Mutex<LoopbackState>>);

impl Loopback {
    pub fn backend(&self) -> LoopbackBackend {
        LoopbackBackend(self.clone())
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, LoopbackState> {
        self.0.lock()
    }

    pub fn inject(&self, fault: Fault) {
        self.0.lock().fault = Some(fault);
    }

    pub fn grant_rate(&self, rate: u32) {
        self.0.lock().granted_rate = Some(rate);
    }

    /// Deliver interleaved capture samples if the input stream is running.
    /// Returns whether anything reached the unit.
    pub fn capture(&self, input: &[f32], channels: usize) -> bool {
        let mut state = self.0.lock();
        if !state.capturing {
            return false;
        }
        match state.port.as_mut() {
            Some(port) => {
                port.process(input, channels);
                true
            }
            None => false,
        }
    }

    /// Capture `periods` pulse periods of the transmitted waveform as a static
    /// echo `delay` samples late, on the left channel only.
    pub fn capture_echo(&self, delay: usize, periods: usize) -> bool {
        let waveform = match &self.0.lock().last_request {
            Some(request) => Arc::clone(&request.waveform),
            None => return false,
        };
        let len = waveform.len();
        let input: Vec<f32> = (0..len * periods)
            .flat_map(|n| [waveform[(n + len - delay % len) % len], 0.0])
            .collect();
        input
            .chunks(1024)
            .fold(true, |ok, chunk| self.capture(chunk, 2) && ok)
    }
}

pub struct LoopbackBackend(Loopback);

impl AudioBackend for LoopbackBackend {
    fn negotiate_sample_rate(&mut self, preferred: u32) -> Result<u32> {
        Ok(self.0.state().granted_rate.unwrap_or(preferred))
    }

    fn open_output(&mut self, request: OutputRequest) -> Result<Box<dyn OutputSink>> {
        let mut state = self.0.state();
        if state.fault == Some(Fault::Output) {
            state.fault = None;
            return Err(Error::device("output busy"));
        }
        state.outputs_opened += 1;
        let sample_rate = request.sample_rate;
        state.last_request = Some(request);
        Ok(Box::new(LoopbackStream {
            shared: self.0.clone(),
            sample_rate,
            input: false,
        }))
    }

    fn open_input(
        &mut self,
        constraints: &CaptureConstraints,
        port: Box<dyn CapturePort>,
    ) -> Result<Box<dyn InputSource>> {
        let mut state = self.0.state();
        if state.fault == Some(Fault::Input) {
            state.fault = None;
            return Err(Error::device("microphone permission denied"));
        }
        state.inputs_opened += 1;
        state.last_constraints = Some(*constraints);
        state.port = Some(port);
        state.capturing = true;
        Ok(Box::new(LoopbackStream {
            shared: self.0.clone(),
            sample_rate: constraints.sample_rate,
            input: true,
        }))
    }
}

struct LoopbackStream {
    shared: Loopback,
    sample_rate: u32,
    input: bool,
}

impl LoopbackStream {
    fn set_running(&self, running: bool) {
        let mut state = self.shared.state();
        if running {
            state.resumes += 1;
        } else {
            state.pauses += 1;
        }
        if self.input {
            state.capturing = running;
        }
    }
}

impl OutputSink for LoopbackStream {
    fn pause(&mut self) -> Result<()> {
        self.set_running(false);
        Ok(())
    }
    fn resume(&mut self) -> Result<()> {
        self.set_running(true);
        Ok(())
    }
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl InputSource for LoopbackStream {
    fn pause(&mut self) -> Result<()> {
        self.set_running(false);
        Ok(())
    }
    fn resume(&mut self) -> Result<()> {
        self.set_running(true);
        Ok(())
    }
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    fn channels(&self) -> u16 {
        2
    }
}

impl Drop for LoopbackStream {
    fn drop(&mut self) {
        let mut state = self.shared.state();
        state.released += 1;
        if self.input {
            state.port = None;
            state.capturing = false;
        }
    }
}

/// Small, fast settings: 5 pulses, default bandwidth and pulse length.
pub fn test_settings() -> SonarSettings {
    SonarSettings::default()
        .with_slow_pulse_count(5)
        .with_clutter_filter(ClutterFilterMode::None)
        .with_offset_compensation(false)
}

/// Control surface on a loopback backend, rendering into a snapshot surface.
pub fn test_surface(loopback: &Loopback, settings: SonarSettings) -> ControlSurface {
    ControlSurfaceBuilder::default()
        .settings(settings)
        .backend(loopback.backend())
        .surface(SnapshotSurface::new())
        .build()
        .expect("Failed to build control surface")
}
