//! CPAL implementation of [`AudioBackend`].

use crate::{
    AudioBackend, CaptureConstraints, InputSource, LoopPlayer, OutputRequest, OutputSink,
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use pingscope_core::{CapturePort, Error, Result};

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. Streams are only
/// touched from the control context that owns the orchestrator.
struct StreamHandle(cpal::Stream);

unsafe impl Send for StreamHandle {}

/// Default host, optionally pinned to device indices.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    output_device: Option<usize>,
    input_device: Option<usize>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_device(mut self, index: Option<usize>) -> Self {
        self.output_device = index;
        self
    }

    pub fn with_input_device(mut self, index: Option<usize>) -> Self {
        self.input_device = index;
        self
    }

    /// Output device names, already prefixed with their index.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let devices = cpal::default_host().output_devices().map_err(Error::device)?;
        device_labels(devices.map(|d| d.name().map_err(Error::device)))
    }

    /// Input device names, already prefixed with their index.
    pub fn list_input_devices() -> Result<Vec<String>> {
        let devices = cpal::default_host().input_devices().map_err(Error::device)?;
        device_labels(devices.map(|d| d.name().map_err(Error::device)))
    }
}

/// `"{index}: {name}"`, the index being what `with_*_device` accepts.
fn device_labels(names: impl Iterator<Item = Result<String>>) -> Result<Vec<String>> {
    names
        .enumerate()
        .map(|(i, name)| Ok(format!("{i}: {}", name?)))
        .collect()
}

impl AudioBackend for CpalBackend {
    fn negotiate_sample_rate(&mut self, preferred: u32) -> Result<u32> {
        let device = get_output_device(self.output_device)?;
        let config = output_config(&device, preferred)?;
        Ok(config.sample_rate().0)
    }

    fn open_output(&mut self, request: OutputRequest) -> Result<Box<dyn OutputSink>> {
        let device = get_output_device(self.output_device)?;
        let config = output_config(&device, request.sample_rate)?;
        let sample_rate = config.sample_rate().0;
        if sample_rate != request.sample_rate {
            return Err(Error::DeviceAcquisition(format!(
                "output device cannot run at {} Hz",
                request.sample_rate
            )));
        }

        let player = LoopPlayer::new(request.waveform, request.second_channel);
        let format = config.sample_format();
        let stream_config: cpal::StreamConfig = config.into();

        let stream = match format {
            cpal::SampleFormat::F32 => build_output::<f32>(&device, &stream_config, player)?,
            cpal::SampleFormat::I16 => build_output::<i16>(&device, &stream_config, player)?,
            cpal::SampleFormat::U16 => build_output::<u16>(&device, &stream_config, player)?,
            format => {
                return Err(Error::DeviceAcquisition(format!(
                    "unsupported output sample format: {format:?}"
                )));
            }
        };
        stream.play().map_err(Error::device)?;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels = stream_config.channels,
            "output stream started"
        );

        Ok(Box::new(CpalStream {
            stream: StreamHandle(stream),
            sample_rate,
            channels: stream_config.channels,
        }))
    }

    fn open_input(
        &mut self,
        constraints: &CaptureConstraints,
        port: Box<dyn CapturePort>,
    ) -> Result<Box<dyn InputSource>> {
        let device = get_input_device(self.input_device)?;
        let config = input_config(&device, constraints)?;
        let format = config.sample_format();
        let stream_config: cpal::StreamConfig = config.into();

        // cpal delivers unprocessed capture; there is no voice-processing
        // stage to switch off.
        if !constraints.is_raw() {
            tracing::warn!("voice processing requested but not available; capturing raw input");
        }

        let stream = match format {
            cpal::SampleFormat::F32 => build_input::<f32>(&device, &stream_config, port)?,
            cpal::SampleFormat::I16 => build_input::<i16>(&device, &stream_config, port)?,
            cpal::SampleFormat::U16 => build_input::<u16>(&device, &stream_config, port)?,
            format => {
                return Err(Error::DeviceAcquisition(format!(
                    "unsupported input sample format: {format:?}"
                )));
            }
        };
        stream.play().map_err(Error::device)?;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = stream_config.sample_rate.0,
            channels = stream_config.channels,
            "input stream started"
        );

        Ok(Box::new(CpalStream {
            stream: StreamHandle(stream),
            sample_rate: stream_config.sample_rate.0,
            channels: stream_config.channels,
        }))
    }
}

struct CpalStream {
    stream: StreamHandle,
    sample_rate: u32,
    channels: u16,
}

impl CpalStream {
    fn pause(&mut self) -> Result<()> {
        self.stream.0.pause().map_err(Error::device)
    }

    fn resume(&mut self) -> Result<()> {
        self.stream.0.play().map_err(Error::device)
    }
}

impl OutputSink for CpalStream {
    fn pause(&mut self) -> Result<()> {
        CpalStream::pause(self)
    }

    fn resume(&mut self) -> Result<()> {
        CpalStream::resume(self)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl InputSource for CpalStream {
    fn pause(&mut self) -> Result<()> {
        CpalStream::pause(self)
    }

    fn resume(&mut self) -> Result<()> {
        CpalStream::resume(self)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}

fn get_output_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices().map_err(Error::device)?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::DeviceAcquisition(format!(
                    "output device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::DeviceAcquisition("no output device available".into())),
    }
}

fn get_input_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.input_devices().map_err(Error::device)?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::DeviceAcquisition(format!(
                    "input device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_input_device()
            .ok_or_else(|| Error::DeviceAcquisition("no input device (microphone) found".into())),
    }
}

/// Prefer a stereo config at `want`; fall back to the device default.
fn output_config(device: &cpal::Device, want: u32) -> Result<cpal::SupportedStreamConfig> {
    let fallback = device.default_output_config().map_err(Error::device)?;
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(Error::device)?
        .collect();

    Ok(pick_config(ranges, want, 2).unwrap_or(fallback))
}

fn input_config(
    device: &cpal::Device,
    constraints: &CaptureConstraints,
) -> Result<cpal::SupportedStreamConfig> {
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map_err(Error::device)?
        .collect();

    pick_config(ranges, constraints.sample_rate, constraints.channels).ok_or_else(|| {
        Error::DeviceAcquisition(format!(
            "input device cannot capture at {} Hz",
            constraints.sample_rate
        ))
    })
}

/// First range containing `want`, preferring exactly `channels` channels.
fn pick_config(
    ranges: Vec<cpal::SupportedStreamConfigRange>,
    want: u32,
    channels: u16,
) -> Option<cpal::SupportedStreamConfig> {
    let rate_ok =
        |r: &cpal::SupportedStreamConfigRange| (r.min_sample_rate().0..=r.max_sample_rate().0).contains(&want);

    let exact = ranges
        .iter()
        .find(|r| r.channels() == channels && rate_ok(r))
        .cloned();
    let any = || ranges.iter().find(|r| r.channels() >= 1 && rate_ok(r)).cloned();

    exact
        .or_else(any)
        .map(|r| r.with_sample_rate(cpal::SampleRate(want)))
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut player: LoopPlayer,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    // Grows on the first callback, then stable
    let mut scratch = Vec::<f32>::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    if scratch.len() < data.len() {
                        scratch.resize(data.len(), 0.0);
                    }
                    let buffer = &mut scratch[..data.len()];
                    player.fill(buffer, channels);
                    write_output(data, buffer);
                }));

                if result.is_err() {
                    output_silence(data);
                }
            },
            |err| tracing::warn!(%err, "output stream error"),
            None,
        )
        .map_err(Error::device)
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut port: Box<dyn CapturePort>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = config.channels as usize;
    let mut scratch = Vec::<f32>::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // A panicking unit loses this buffer only
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|s| s.to_sample::<f32>()));
                    port.process(&scratch, channels);
                }));
            },
            |err| tracing::warn!(%err, "input stream error"),
            None,
        )
        .map_err(Error::device)
}

#[inline]
fn write_output<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T], output: &[f32]) {
    for (sample, &value) in data.iter_mut().zip(output) {
        *sample = T::from_sample(value);
    }
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
