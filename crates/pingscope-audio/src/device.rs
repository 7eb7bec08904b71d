//! Device seam between the orchestrator and an audio host.

use pingscope_core::{CapturePort, Result};
use std::sync::Arc;

/// What the second output channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondChannel {
    #[default]
    Silent,
    /// Same samples as channel 0
    Mirror,
}

/// Everything needed to open the transmit loop.
#[derive(Debug, Clone)]
pub struct OutputRequest {
    /// One pulse; played back to back forever
    pub waveform: Arc<[f32]>,
    pub sample_rate: u32,
    pub second_channel: SecondChannel,
}

/// Input stream constraints. The processing chain expects raw capture:
/// every voice-processing stage stays off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub channels: u16,
    pub sample_rate: u32,
    pub auto_gain_control: bool,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
}

impl CaptureConstraints {
    /// Stereo raw capture at `sample_rate`.
    pub fn raw_stereo(sample_rate: u32) -> Self {
        Self {
            channels: 2,
            sample_rate,
            auto_gain_control: false,
            echo_cancellation: false,
            noise_suppression: false,
        }
    }

    pub fn is_raw(&self) -> bool {
        !(self.auto_gain_control || self.echo_cancellation || self.noise_suppression)
    }
}

/// Host audio system. Opening a stream starts it; dropping the returned
/// handle releases the device.
pub trait AudioBackend: Send {
    /// Rate the output would run at when asked for `preferred`.
    fn negotiate_sample_rate(&mut self, preferred: u32) -> Result<u32>;

    fn open_output(&mut self, request: OutputRequest) -> Result<Box<dyn OutputSink>>;

    /// Open the microphone and feed every callback buffer into `port`.
    fn open_input(
        &mut self,
        constraints: &CaptureConstraints,
        port: Box<dyn CapturePort>,
    ) -> Result<Box<dyn InputSource>>;
}

/// A running transmit stream.
pub trait OutputSink: Send {
    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn sample_rate(&self) -> u32;
}

/// A running capture stream.
pub trait InputSource: Send {
    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn sample_rate(&self) -> u32;
    fn channels(&self) -> u16;
}
