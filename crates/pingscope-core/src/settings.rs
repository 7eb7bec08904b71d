//! User-facing sonar knobs.
//!
//! [`SonarSettings`] is an immutable snapshot: every change produces a new
//! value which is fed through [`crate::derive`]. The bandwidth and chirp
//! length knobs are logarithmic indices, not physical units.
//!
//! ```
//! use pingscope_core::{SonarSettings, ClutterFilterMode};
//!
//! let settings = SonarSettings::default()
//!     .with_center_frequency(18_000)
//!     .with_slow_pulse_count(21)
//!     .with_clutter_filter(ClutterFilterMode::TwoPulseCanceller);
//! assert!(settings.validate().is_ok());
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Inclusive integer range of a knob, with its step and default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnobRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: i32,
}

impl KnobRange {
    pub const fn new(min: i32, max: i32, step: i32, default: i32) -> Self {
        Self {
            min,
            max,
            step,
            default,
        }
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max && (value - self.min) % self.step == 0
    }

    /// Clamp into range and snap onto the step grid (rounding down).
    pub fn clamp(&self, value: i32) -> i32 {
        let v = value.clamp(self.min, self.max);
        v - (v - self.min) % self.step
    }

    /// Number of distinct positions.
    pub fn positions(&self) -> usize {
        ((self.max - self.min) / self.step + 1) as usize
    }

    /// Iterate all valid knob positions in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = i32> {
        let step = self.step as usize;
        (self.min..=self.max).step_by(step)
    }
}

pub const CENTER_FREQUENCY_RANGE: KnobRange = KnobRange::new(1_000, 22_000, 1, 18_000);
pub const BANDWIDTH_INDEX_RANGE: KnobRange = KnobRange::new(-8, 8, 1, 0);
pub const CHIRP_LENGTH_INDEX_RANGE: KnobRange = KnobRange::new(-8, 10, 1, 0);
/// Odd pulse counts only.
pub const SLOW_PULSE_COUNT_RANGE: KnobRange = KnobRange::new(1, 201, 2, 21);

/// Slow-time clutter suppression applied by the processing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClutterFilterMode {
    #[default]
    None,
    /// `y[n] = x[n] - x[n-1]` across pulses.
    TwoPulseCanceller,
    /// Subtract a slowly adapting per-range-bin clutter estimate.
    SlowClutterMapSubtract,
    /// Subtract the slow-time mean of each range bin within the CPI.
    RemoveZeroDoppler,
}

impl ClutterFilterMode {
    pub const ALL: [ClutterFilterMode; 4] = [
        Self::None,
        Self::TwoPulseCanceller,
        Self::SlowClutterMapSubtract,
        Self::RemoveZeroDoppler,
    ];

    /// Wire code used in the processing-unit init message.
    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::TwoPulseCanceller => 1,
            Self::SlowClutterMapSubtract => 2,
            Self::RemoveZeroDoppler => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::TwoPulseCanceller => "Two-pulse canceller",
            Self::SlowClutterMapSubtract => "Slow clutter map",
            Self::RemoveZeroDoppler => "Remove zero Doppler",
        }
    }
}

/// Snapshot of every user-controlled sonar knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonarSettings {
    /// Carrier frequency in Hz
    pub center_frequency_hz: u32,
    /// Logarithmic bandwidth control, see [`crate::derive`]
    pub bandwidth_index: i32,
    /// Logarithmic pulse length control, see [`crate::derive`]
    pub chirp_length_index: i32,
    /// Pulses integrated per coherent processing interval (odd)
    pub slow_pulse_count: u32,
    pub clutter_filter: ClutterFilterMode,
    /// Compensate the render-to-capture delay
    pub offset_compensation: bool,
    /// Taper slow time before Doppler processing
    pub window_enabled: bool,
}

impl Default for SonarSettings {
    fn default() -> Self {
        Self {
            center_frequency_hz: CENTER_FREQUENCY_RANGE.default as u32,
            bandwidth_index: BANDWIDTH_INDEX_RANGE.default,
            chirp_length_index: CHIRP_LENGTH_INDEX_RANGE.default,
            slow_pulse_count: SLOW_PULSE_COUNT_RANGE.default as u32,
            clutter_filter: ClutterFilterMode::default(),
            offset_compensation: true,
            window_enabled: true,
        }
    }
}

impl SonarSettings {
    /// Builder-style setters clamp into the knob ranges, like a UI slider would.
    pub fn with_center_frequency(mut self, hz: u32) -> Self {
        self.center_frequency_hz = CENTER_FREQUENCY_RANGE.clamp(hz.min(i32::MAX as u32) as i32) as u32;
        self
    }

    pub fn with_bandwidth_index(mut self, index: i32) -> Self {
        self.bandwidth_index = BANDWIDTH_INDEX_RANGE.clamp(index);
        self
    }

    pub fn with_chirp_length_index(mut self, index: i32) -> Self {
        self.chirp_length_index = CHIRP_LENGTH_INDEX_RANGE.clamp(index);
        self
    }

    /// Even counts snap down to the next odd value.
    pub fn with_slow_pulse_count(mut self, count: u32) -> Self {
        self.slow_pulse_count =
            SLOW_PULSE_COUNT_RANGE.clamp(count.min(i32::MAX as u32) as i32) as u32;
        self
    }

    pub fn with_clutter_filter(mut self, mode: ClutterFilterMode) -> Self {
        self.clutter_filter = mode;
        self
    }

    pub fn with_offset_compensation(mut self, enabled: bool) -> Self {
        self.offset_compensation = enabled;
        self
    }

    pub fn with_window(mut self, enabled: bool) -> Self {
        self.window_enabled = enabled;
        self
    }

    /// Check every knob against its range.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (
                "center_frequency_hz",
                self.center_frequency_hz as i64,
                CENTER_FREQUENCY_RANGE,
            ),
            (
                "bandwidth_index",
                self.bandwidth_index as i64,
                BANDWIDTH_INDEX_RANGE,
            ),
            (
                "chirp_length_index",
                self.chirp_length_index as i64,
                CHIRP_LENGTH_INDEX_RANGE,
            ),
            (
                "slow_pulse_count",
                self.slow_pulse_count as i64,
                SLOW_PULSE_COUNT_RANGE,
            ),
        ];

        for (name, value, range) in checks {
            let in_range = i32::try_from(value).is_ok_and(|v| range.contains(v));
            if !in_range {
                return Err(Error::InvalidSettings(format!(
                    "{name} = {value} outside {}..={} (step {})",
                    range.min, range.max, range.step
                )));
            }
        }
        Ok(())
    }
}
