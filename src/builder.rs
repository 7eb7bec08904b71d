//! Builder for configuring and constructing a `ControlSurface`.

use crate::control::SharedRenderer;
use crate::{ControlSurface, PingscopeConfig, Result};
use parking_lot::Mutex;
use pingscope_audio::{AudioBackend, AudioGraphOrchestrator};
use pingscope_core::{
    ChirpSynthesizer, DesignConstants, ModuleSource, ProcessingUnit, SignalSynthesis,
    SonarSettings,
};
use pingscope_dsp::PulseDopplerUnit;
use pingscope_render::{DisplaySurface, NullSurface, RangeDopplerRenderer};
use std::sync::Arc;

/// Anything not supplied falls back to the configuration: the cpal backend
/// (with the `cpal` feature), the built-in pulse-Doppler unit, the chirp
/// synthesizer and a PNG or null display surface.
///
/// # Example
///
/// ```ignore
/// use pingscope::prelude::*;
///
/// let mut surface = ControlSurface::builder()
///     .settings(SonarSettings::default().with_slow_pulse_count(31))
///     .build()?;
///
/// surface.start()?;
/// loop {
///     surface.pump();
///     println!("peak {:.2}", surface.peak_level());
/// }
/// ```
#[derive(Default)]
pub struct ControlSurfaceBuilder {
    config: PingscopeConfig,
    backend: Option<Box<dyn AudioBackend>>,
    unit: Option<Box<dyn ProcessingUnit>>,
    synthesis: Option<Arc<dyn SignalSynthesis>>,
    surface: Option<Box<dyn DisplaySurface + Send>>,
}

impl ControlSurfaceBuilder {
    /// Replaces every configured value set so far.
    pub fn config(mut self, config: PingscopeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn settings(mut self, settings: SonarSettings) -> Self {
        self.config.settings = settings;
        self
    }

    pub fn constants(mut self, constants: DesignConstants) -> Self {
        self.config.constants = constants;
        self
    }

    pub fn module(mut self, module: ModuleSource) -> Self {
        self.config.module = module;
        self
    }

    pub fn backend(mut self, backend: impl AudioBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn unit(mut self, unit: impl ProcessingUnit + 'static) -> Self {
        self.unit = Some(Box::new(unit));
        self
    }

    pub fn synthesis(mut self, synthesis: impl SignalSynthesis + 'static) -> Self {
        self.synthesis = Some(Arc::new(synthesis));
        self
    }

    pub fn surface(mut self, surface: impl DisplaySurface + Send + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    pub fn build(self) -> Result<ControlSurface> {
        self.config.validate()?;
        let config = self.config;

        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&config)?,
        };
        let unit = self
            .unit
            .unwrap_or_else(|| Box::new(PulseDopplerUnit::with_capacity(config.audio.message_capacity)));
        let synthesis = self
            .synthesis
            .unwrap_or_else(|| Arc::new(ChirpSynthesizer::new(config.audio.transmit_amplitude)));
        let surface = self.surface.unwrap_or_else(|| default_surface(&config));

        let renderer: SharedRenderer = Arc::new(Mutex::new(
            RangeDopplerRenderer::new(surface).with_channel(config.render.channel),
        ));
        let orchestrator = AudioGraphOrchestrator::new(backend, unit, synthesis);

        tracing::debug!(
            center_hz = config.settings.center_frequency_hz,
            sample_rate = config.constants.sample_rate,
            "control surface built"
        );
        Ok(ControlSurface::from_parts(
            config.session_config(),
            orchestrator,
            renderer,
        ))
    }
}

#[cfg(feature = "cpal")]
fn default_backend(config: &PingscopeConfig) -> Result<Box<dyn AudioBackend>> {
    Ok(Box::new(
        pingscope_audio::CpalBackend::new()
            .with_output_device(config.audio.output_device)
            .with_input_device(config.audio.input_device),
    ))
}

#[cfg(not(feature = "cpal"))]
fn default_backend(_config: &PingscopeConfig) -> Result<Box<dyn AudioBackend>> {
    Err(pingscope_core::Error::InvalidConfig(
        "no audio backend: enable the `cpal` feature or supply one".into(),
    )
    .into())
}

fn default_surface(config: &PingscopeConfig) -> Box<dyn DisplaySurface + Send> {
    #[cfg(feature = "png")]
    if let Some(path) = &config.render.png_path {
        return Box::new(
            pingscope_render::PngSurface::new(path).with_interval(config.render.png_interval),
        );
    }
    #[cfg(not(feature = "png"))]
    if config.render.png_path.is_some() {
        tracing::warn!("png_path set but the `png` feature is disabled");
    }
    Box::new(NullSurface::new())
}
