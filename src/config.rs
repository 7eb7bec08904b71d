//! File-based configuration.

use crate::Result;
use pingscope_audio::{SecondChannel, SessionConfig};
use pingscope_core::unit::DEFAULT_MESSAGE_CAPACITY;
use pingscope_core::{DesignConstants, Error, ModuleSource, SonarSettings};
use pingscope_render::IntensityChannel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Device selection and transmit options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device index; `None` picks the host default
    pub output_device: Option<usize>,
    /// Input device index; `None` picks the host default
    pub input_device: Option<usize>,
    /// Play the pulse on both output channels instead of the left only
    pub mirror_second_channel: bool,
    /// Peak amplitude of the transmitted pulse
    pub transmit_amplitude: f32,
    /// Runtime messages in flight between capture and relay
    pub message_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output_device: None,
            input_device: None,
            mirror_second_channel: false,
            transmit_amplitude: 0.5,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub channel: IntensityChannel,
    /// Write range-Doppler snapshots here
    pub png_path: Option<PathBuf>,
    /// Write every n-th frame
    pub png_interval: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            channel: IntensityChannel::default(),
            png_path: None,
            png_interval: 10,
        }
    }
}

/// Everything a [`ControlSurface`](crate::ControlSurface) can be built from.
///
/// ```toml
/// [settings]
/// center_frequency_hz = 18000
/// slow_pulse_count = 21
/// clutter_filter = "two-pulse-canceller"
///
/// [audio]
/// mirror_second_channel = true
///
/// [render]
/// png_path = "map.png"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PingscopeConfig {
    pub settings: SonarSettings,
    pub constants: DesignConstants,
    pub module: ModuleSource,
    pub audio: AudioConfig,
    pub render: RenderConfig,
}

impl PingscopeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(Error::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        self.constants.validate()?;

        if !(0.0..=1.0).contains(&self.audio.transmit_amplitude) {
            return Err(Error::InvalidConfig(format!(
                "transmit_amplitude {} out of range (0-1)",
                self.audio.transmit_amplitude
            ))
            .into());
        }
        if self.audio.message_capacity == 0 {
            return Err(Error::InvalidConfig("message_capacity must be at least 1".into()).into());
        }
        if self.render.png_interval == 0 {
            return Err(Error::InvalidConfig("png_interval must be at least 1".into()).into());
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        let second_channel = if self.audio.mirror_second_channel {
            SecondChannel::Mirror
        } else {
            SecondChannel::Silent
        };
        SessionConfig::new(self.settings, self.constants)
            .with_module(self.module.clone())
            .with_second_channel(second_channel)
    }
}
