//! Message contract with the processing unit.
//!
//! The control side sends one [`InitPayload`] per session; the unit answers
//! with any number of [`RuntimeMessage`]s.

use crate::{ClutterFilterMode, DerivedParameters, DesignConstants, SonarSettings};
use std::sync::Arc;

/// Opaque bytes of the processing module. Empty for built-in units.
pub type ModuleBytes = Arc<[u8]>;

/// One-time configuration handed to the processing unit at session start.
#[derive(Debug, Clone, PartialEq)]
pub struct InitPayload {
    pub module_bytes: ModuleBytes,
    /// One transmitted pulse, as played by the output loop
    pub reference_waveform: Arc<[f32]>,
    /// Carrier Hz / device sample rate, in (0, 0.5)
    pub normalized_carrier: f64,
    /// Device sample rate in Hz
    pub sample_rate: f64,
    /// Clutter map pole coefficient
    pub clutter_alpha: f64,
    /// Slow-time window, one coefficient per pulse
    pub slow_time_window: Arc<[f32]>,
    pub decimation_factor: usize,
    pub clutter_filter: ClutterFilterMode,
    pub offset_compensation: bool,
}

impl InitPayload {
    /// Assemble the payload from one settings/derived pair.
    pub fn new(
        module_bytes: ModuleBytes,
        reference_waveform: Arc<[f32]>,
        slow_time_window: Arc<[f32]>,
        settings: &SonarSettings,
        derived: &DerivedParameters,
        constants: &DesignConstants,
    ) -> Self {
        Self {
            module_bytes,
            reference_waveform,
            normalized_carrier: derived.normalized_carrier(),
            sample_rate: derived.sample_rate,
            clutter_alpha: derived.clutter_pole(constants),
            slow_time_window,
            decimation_factor: derived.decimation_factor,
            clutter_filter: settings.clutter_filter,
            offset_compensation: settings.offset_compensation,
        }
    }

    /// Pulse length in samples.
    pub fn chirp_length(&self) -> usize {
        self.reference_waveform.len()
    }

    /// Pulses per frame.
    pub fn slow_pulse_count(&self) -> usize {
        self.slow_time_window.len()
    }

    /// `ceil(chirp_length / decimation_factor)`
    pub fn fast_bins(&self) -> usize {
        self.chirp_length().div_ceil(self.decimation_factor.max(1))
    }

    /// Frame length the unit will emit.
    pub fn frame_len(&self) -> usize {
        self.fast_bins() * self.slow_pulse_count()
    }
}

/// Output of the processing unit. Either field may be absent, meaning
/// "no update" for that quantity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuntimeMessage {
    /// Range-Doppler magnitudes, `fast_bins * slow_pulse_count` long,
    /// fast-time bin varying fastest
    pub fast_slow: Option<Vec<f32>>,
    /// Input peak level in [0, 1]
    pub peak: Option<f32>,
}

impl RuntimeMessage {
    pub fn frame(frame: Vec<f32>) -> Self {
        Self {
            fast_slow: Some(frame),
            peak: None,
        }
    }

    pub fn peak(level: f32) -> Self {
        Self {
            fast_slow: None,
            peak: Some(level.clamp(0.0, 1.0)),
        }
    }

    pub fn with_peak(mut self, level: f32) -> Self {
        self.peak = Some(level.clamp(0.0, 1.0));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fast_slow.is_none() && self.peak.is_none()
    }
}
