//! Transmit waveform and slow-time window generation.
//!
//! The orchestrator only sees the [`SignalSynthesis`] trait; the default
//! [`ChirpSynthesizer`] emits a Hann-tapered hyperbolic chirp spanning
//! `center ± bandwidth / 2`.

use crate::{DerivedParameters, SonarSettings};
use core::f64::consts::PI;

/// Produces the transmit pulse and the slow-time taper for a configuration.
pub trait SignalSynthesis: Send + Sync {
    /// One pulse, `derived.chirp_length_samples` long, amplitude within ±1.
    fn transmit_waveform(&self, settings: &SonarSettings, derived: &DerivedParameters)
        -> Vec<f32>;

    /// Slow-time window, `derived.slow_pulse_count` long.
    fn slow_time_window(&self, settings: &SonarSettings, derived: &DerivedParameters) -> Vec<f32>;
}

/// Default synthesizer: hyperbolic chirp with Hann envelope.
#[derive(Debug, Clone, Copy)]
pub struct ChirpSynthesizer {
    /// Peak amplitude of the transmitted pulse
    pub amplitude: f32,
}

impl Default for ChirpSynthesizer {
    fn default() -> Self {
        Self { amplitude: 0.5 }
    }
}

impl ChirpSynthesizer {
    pub fn new(amplitude: f32) -> Self {
        Self {
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }
}

impl SignalSynthesis for ChirpSynthesizer {
    fn transmit_waveform(
        &self,
        settings: &SonarSettings,
        derived: &DerivedParameters,
    ) -> Vec<f32> {
        let taper = hann(derived.chirp_length_samples);
        hyperbolic_chirp(
            settings.center_frequency_hz as f64,
            derived.bandwidth_hz as f64,
            derived.sample_rate,
            derived.chirp_length_samples,
        )
        .into_iter()
        .zip(taper)
        .map(|(s, w)| s * w * self.amplitude)
        .collect()
    }

    fn slow_time_window(&self, settings: &SonarSettings, derived: &DerivedParameters) -> Vec<f32> {
        if settings.window_enabled {
            hann(derived.slow_pulse_count)
        } else {
            vec![1.0; derived.slow_pulse_count]
        }
    }
}

/// Hyperbolic (linear-period) chirp sweeping `center - bw/2` to `center + bw/2`.
///
/// Frequencies are clamped to stay positive and below Nyquist.
pub fn hyperbolic_chirp(center_hz: f64, bandwidth_hz: f64, sample_rate: f64, n: usize) -> Vec<f32> {
    let nyquist = sample_rate / 2.0;
    let f0 = (center_hz - bandwidth_hz / 2.0).clamp(1.0, nyquist);
    let f1 = (center_hz + bandwidth_hz / 2.0).clamp(1.0, nyquist);
    let duration = n as f64 / sample_rate;

    if n == 0 {
        return Vec::new();
    }
    if (f1 - f0).abs() < f64::EPSILON {
        return (0..n)
            .map(|i| (2.0 * PI * f0 * i as f64 / sample_rate).sin() as f32)
            .collect();
    }

    let sweep = f1 - f0;
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            // Instantaneous frequency f0*f1*T / (f1*T - sweep*t)
            let phase = (-2.0 * PI * f0 * f1 * duration / sweep)
                * (1.0 - sweep * t / (f1 * duration)).ln();
            phase.sin() as f32
        })
        .collect()
}

/// Symmetric Hann window. A single-point window is `[1.0]`.
pub fn hann(n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n)
            .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos()) as f32)
            .collect(),
    }
}
