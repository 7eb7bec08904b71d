//! Sonar design parameters derived from [`SonarSettings`].
//!
//! [`derive`] is a pure function: identical inputs give bit-identical
//! outputs. It does not guard against degenerate inputs (a zero bandwidth
//! or zero CPI yields NaN/-inf); validate settings and constants first.

use crate::{Error, Result, SonarSettings};
use serde::{Deserialize, Serialize};

/// Physical and audio constants the parameter model depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConstants {
    /// Audio sample rate in Hz
    pub sample_rate: f64,
    /// Speed of sound in m/s
    pub speed_of_sound: f64,
    /// Clutter map time constant in seconds
    pub clutter_time_constant: f64,
    /// Sample-rate headroom over the bandwidth when choosing the decimation factor
    pub bandwidth_oversampling: f64,
}

impl Default for DesignConstants {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            speed_of_sound: 343.0,
            clutter_time_constant: 0.1,
            bandwidth_oversampling: 1.3,
        }
    }
}

impl DesignConstants {
    /// Same constants, different sample rate (e.g. the rate the device granted).
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Every knob combination must give a decimation factor of at least one.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000.0 || self.sample_rate > 384000.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.speed_of_sound <= 0.0 || self.clutter_time_constant <= 0.0 {
            return Err(Error::InvalidConfig(
                "speed_of_sound and clutter_time_constant must be positive".into(),
            ));
        }
        if self.bandwidth_oversampling < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "bandwidth_oversampling {} must be >= 1.0",
                self.bandwidth_oversampling
            )));
        }

        let widest = bandwidth_hz(crate::settings::BANDWIDTH_INDEX_RANGE.max) as f64;
        if self.sample_rate < widest * self.bandwidth_oversampling {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} too low for {} Hz bandwidth",
                self.sample_rate, widest
            )));
        }
        Ok(())
    }
}

/// Everything the orchestrator, renderer and readout need, derived from one
/// settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedParameters {
    pub sample_rate: f64,
    pub center_frequency_hz: u32,
    pub slow_pulse_count: usize,
    pub bandwidth_hz: u32,
    pub chirp_length_samples: usize,
    pub decimation_factor: usize,
    pub fast_bins: usize,
    pub chirp_duration_s: f64,
    pub pulse_repetition_freq_hz: f64,
    pub wavelength_m: f64,
    pub cpi_duration_s: f64,
    pub range_resolution_m: f64,
    pub velocity_resolution_mps: f64,
    pub range_ambiguity_m: f64,
    pub velocity_ambiguity_mps: f64,
    pub integration_gain_db: f64,
}

/// `round(40 * 2^(index/4)) * 100`
pub fn bandwidth_hz(bandwidth_index: i32) -> u32 {
    ((40.0 * 2f64.powf(bandwidth_index as f64 / 4.0)).round() as u32) * 100
}

/// `round(512 * 2^(index/4))`
pub fn chirp_length_samples(chirp_length_index: i32) -> usize {
    (512.0 * 2f64.powf(chirp_length_index as f64 / 4.0)).round() as usize
}

/// Derive every design parameter from a settings snapshot.
pub fn derive(settings: &SonarSettings, constants: &DesignConstants) -> DerivedParameters {
    let sr = constants.sample_rate;
    let c = constants.speed_of_sound;

    let bandwidth = bandwidth_hz(settings.bandwidth_index);
    let chirp_len = chirp_length_samples(settings.chirp_length_index);
    let decimation =
        (sr / (bandwidth as f64 * constants.bandwidth_oversampling)).floor() as usize;
    let fast_bins = (chirp_len as f64 / decimation as f64).ceil() as usize;
    let pulses = settings.slow_pulse_count as usize;

    let chirp_duration = chirp_len as f64 / sr;
    let wavelength = c / settings.center_frequency_hz as f64;
    let cpi = (chirp_len * pulses) as f64 / sr;

    DerivedParameters {
        sample_rate: sr,
        center_frequency_hz: settings.center_frequency_hz,
        slow_pulse_count: pulses,
        bandwidth_hz: bandwidth,
        chirp_length_samples: chirp_len,
        decimation_factor: decimation,
        fast_bins,
        chirp_duration_s: chirp_duration,
        pulse_repetition_freq_hz: 1.0 / chirp_duration,
        wavelength_m: wavelength,
        cpi_duration_s: cpi,
        range_resolution_m: (c / sr) * decimation as f64,
        velocity_resolution_mps: (1.0 / cpi) * wavelength,
        range_ambiguity_m: chirp_duration * c,
        velocity_ambiguity_mps: (0.5 / chirp_duration) * wavelength,
        integration_gain_db: 10.0 * (bandwidth as f64 * cpi).log10(),
    }
}

impl DerivedParameters {
    /// Number of values in one range-Doppler frame.
    pub fn frame_len(&self) -> usize {
        self.fast_bins * self.slow_pulse_count
    }

    /// Display dimensions: (width = fast bins, height = pulses).
    pub fn frame_dimensions(&self) -> (usize, usize) {
        (self.fast_bins, self.slow_pulse_count)
    }

    /// Carrier divided by the sample rate, the unit's mixing frequency.
    pub fn normalized_carrier(&self) -> f64 {
        self.center_frequency_hz as f64 / self.sample_rate
    }

    /// One-pole clutter map coefficient: `exp(-pulse period / time constant)`.
    pub fn clutter_pole(&self, constants: &DesignConstants) -> f64 {
        (-self.chirp_duration_s / constants.clutter_time_constant).exp()
    }

    /// Labelled readout rows, computed only from these parameters.
    pub fn readout(&self) -> Vec<Readout> {
        vec![
            Readout::new("Bandwidth", format!("{} Hz", self.bandwidth_hz)),
            Readout::new(
                "Chirp length",
                format!("{} samples", self.chirp_length_samples),
            ),
            Readout::new("Decimation", format!("{}", self.decimation_factor)),
            Readout::new("Range bins", format!("{}", self.fast_bins)),
            Readout::new(
                "Chirp duration",
                format!("{:.2} ms", self.chirp_duration_s * 1e3),
            ),
            Readout::new("PRF", format!("{:.1} Hz", self.pulse_repetition_freq_hz)),
            Readout::new("Wavelength", format!("{:.2} cm", self.wavelength_m * 1e2)),
            Readout::new("CPI", format!("{:.3} s", self.cpi_duration_s)),
            Readout::new(
                "Range resolution",
                format!("{:.3} m", self.range_resolution_m),
            ),
            Readout::new(
                "Velocity resolution",
                format!("{:.3} m/s", self.velocity_resolution_mps),
            ),
            Readout::new(
                "Range ambiguity",
                format!("{:.2} m", self.range_ambiguity_m),
            ),
            Readout::new(
                "Velocity ambiguity",
                format!("±{:.2} m/s", self.velocity_ambiguity_mps),
            ),
            Readout::new(
                "Integration gain",
                format!("{:.1} dB", self.integration_gain_db),
            ),
        ]
    }
}

/// One labelled display value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readout {
    pub label: &'static str,
    pub value: String,
}

impl Readout {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

impl core::fmt::Display for Readout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}
