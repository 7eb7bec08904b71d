//! Real-time pulse-Doppler kernel fed by the capture callback.

use crate::{ClutterFilter, DopplerProcessor, MatchedFilter, PulseBaseband};
use pingscope_core::{CapturePort, Error, InitPayload, Result, RuntimeMessage, UnitOutbox};
use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Peak level reports per second.
const PEAK_RATE_HZ: f64 = 20.0;

/// Per-session processing state. Everything is allocated in [`new`](Self::new);
/// the capture path only allocates the outgoing frame.
pub struct DopplerKernel {
    baseband: PulseBaseband,
    matched: MatchedFilter,
    clutter: ClutterFilter,
    doppler: DopplerProcessor,
    offset_compensation: bool,
    outbox: UnitOutbox,

    pulse: Vec<f32>,
    filled: usize,
    /// `pulses` rows of `fast_bins`, pulse-major
    frame: Vec<Complex32>,
    pulses_filled: usize,

    peak: f32,
    peak_samples: usize,
    peak_interval: usize,
    frames_emitted: u64,
    /// Set from the control context; taken at the next capture buffer.
    restart: Arc<AtomicBool>,
}

impl DopplerKernel {
    pub fn new(payload: &InitPayload, outbox: UnitOutbox) -> Result<Self> {
        validate(payload)?;

        let pulse_len = payload.chirp_length();
        let baseband = PulseBaseband::new(
            pulse_len,
            payload.normalized_carrier,
            payload.decimation_factor,
        );
        let fast_bins = baseband.fast_bins();
        let pulses = payload.slow_pulse_count();

        let mut reference = vec![Complex32::new(0.0, 0.0); fast_bins];
        baseband.process(&payload.reference_waveform, &mut reference);

        let mut planner = FftPlanner::new();
        let matched = MatchedFilter::new(&mut planner, &reference);
        let doppler = DopplerProcessor::new(&mut planner, &payload.slow_time_window);
        let clutter = ClutterFilter::new(payload.clutter_filter, payload.clutter_alpha, fast_bins);

        Ok(Self {
            baseband,
            matched,
            clutter,
            doppler,
            offset_compensation: payload.offset_compensation,
            outbox,
            pulse: vec![0.0; pulse_len],
            filled: 0,
            frame: vec![Complex32::new(0.0, 0.0); fast_bins * pulses],
            pulses_filled: 0,
            peak: 0.0,
            peak_samples: 0,
            peak_interval: ((payload.sample_rate / PEAK_RATE_HZ).round() as usize).max(1),
            frames_emitted: 0,
            restart: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn fast_bins(&self) -> usize {
        self.baseband.fast_bins()
    }

    pub fn slow_pulse_count(&self) -> usize {
        self.doppler.pulses()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Raising the flag drops the partial pulse, the partial frame and the
    /// pending peak before the next buffer is consumed.
    pub fn restart_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.restart)
    }

    fn discard_partial(&mut self) {
        self.filled = 0;
        self.pulses_filled = 0;
        self.peak = 0.0;
        self.peak_samples = 0;
    }

    #[inline]
    fn push_sample(&mut self, sample: f32) {
        self.peak = self.peak.max(sample.abs());
        self.peak_samples += 1;
        if self.peak_samples >= self.peak_interval {
            self.outbox.post(RuntimeMessage::peak(self.peak));
            self.peak = 0.0;
            self.peak_samples = 0;
        }

        self.pulse[self.filled] = sample;
        self.filled += 1;
        if self.filled == self.pulse.len() {
            self.filled = 0;
            self.finish_pulse();
        }
    }

    fn finish_pulse(&mut self) {
        let fast_bins = self.fast_bins();
        let start = self.pulses_filled * fast_bins;
        let row = &mut self.frame[start..start + fast_bins];
        self.baseband.process(&self.pulse, row);
        self.matched.apply(row);

        self.pulses_filled += 1;
        if self.pulses_filled == self.slow_pulse_count() {
            self.pulses_filled = 0;
            self.finish_frame();
        }
    }

    fn finish_frame(&mut self) {
        let fast_bins = self.fast_bins();
        if self.offset_compensation {
            let shift = direct_path_bin(&self.frame, fast_bins);
            for row in self.frame.chunks_mut(fast_bins) {
                row.rotate_left(shift);
            }
        }
        self.clutter.apply(&mut self.frame, fast_bins);

        let mut magnitudes = vec![0.0; self.frame.len()];
        self.doppler.process(&self.frame, fast_bins, &mut magnitudes);
        self.outbox.post(RuntimeMessage::frame(magnitudes));
        self.frames_emitted += 1;
    }
}

impl CapturePort for DopplerKernel {
    fn process(&mut self, input: &[f32], channels: usize) {
        if self.restart.swap(false, Ordering::AcqRel) {
            self.discard_partial();
        }
        for frame in input.chunks(channels.max(1)) {
            self.push_sample(frame[0]);
        }
    }
}

/// Range bin with the strongest coherent (zero-Doppler) return. The
/// speaker-to-microphone path dominates, so this is the loop latency.
pub fn direct_path_bin(frame: &[Complex32], fast_bins: usize) -> usize {
    let mut best = (0, f32::MIN);
    for bin in 0..fast_bins {
        let sum: Complex32 = frame.iter().skip(bin).step_by(fast_bins).sum();
        let power = sum.norm_sqr();
        if power > best.1 {
            best = (bin, power);
        }
    }
    best.0
}

fn validate(payload: &InitPayload) -> Result<()> {
    let reject = |reason: &str| Err(Error::ModuleLoad(format!("invalid init payload: {reason}")));

    if payload.reference_waveform.is_empty() {
        return reject("empty reference waveform");
    }
    if payload.slow_time_window.is_empty() {
        return reject("empty slow-time window");
    }
    if payload.decimation_factor == 0 {
        return reject("decimation factor must be at least 1");
    }
    if !(payload.normalized_carrier > 0.0 && payload.normalized_carrier < 0.5) {
        return reject("normalized carrier outside (0, 0.5)");
    }
    if !(payload.sample_rate > 0.0) {
        return reject("sample rate must be positive");
    }
    Ok(())
}
