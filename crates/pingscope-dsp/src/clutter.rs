//! Slow-time clutter suppression.

use pingscope_core::ClutterFilterMode;
use rustfft::num_complex::Complex32;

/// Clutter filter with the state it carries between frames.
///
/// Frames are `pulses` rows of `fast_bins` values, pulse-major.
pub struct ClutterFilter {
    mode: ClutterFilterMode,
    alpha: f32,
    /// Last pulse seen, for the two-pulse canceller
    previous: Vec<Complex32>,
    /// One-pole clutter estimate per range bin
    map: Vec<Complex32>,
    primed: bool,
}

impl ClutterFilter {
    pub fn new(mode: ClutterFilterMode, alpha: f64, fast_bins: usize) -> Self {
        Self {
            mode,
            alpha: alpha.clamp(0.0, 1.0) as f32,
            previous: vec![Complex32::new(0.0, 0.0); fast_bins],
            map: vec![Complex32::new(0.0, 0.0); fast_bins],
            primed: false,
        }
    }

    pub fn mode(&self) -> ClutterFilterMode {
        self.mode
    }

    pub fn apply(&mut self, frame: &mut [Complex32], fast_bins: usize) {
        match self.mode {
            ClutterFilterMode::None => {}
            ClutterFilterMode::TwoPulseCanceller => self.two_pulse(frame, fast_bins),
            ClutterFilterMode::SlowClutterMapSubtract => self.clutter_map(frame, fast_bins),
            ClutterFilterMode::RemoveZeroDoppler => remove_mean(frame, fast_bins),
        }
    }

    fn two_pulse(&mut self, frame: &mut [Complex32], fast_bins: usize) {
        for row in frame.chunks_mut(fast_bins) {
            if !self.primed {
                self.previous.copy_from_slice(row);
                self.primed = true;
            }
            for (x, prev) in row.iter_mut().zip(self.previous.iter_mut()) {
                let current = *x;
                *x = current - *prev;
                *prev = current;
            }
        }
    }

    fn clutter_map(&mut self, frame: &mut [Complex32], fast_bins: usize) {
        let alpha = self.alpha;
        for row in frame.chunks_mut(fast_bins) {
            if !self.primed {
                self.map.copy_from_slice(row);
                self.primed = true;
            }
            for (x, clutter) in row.iter_mut().zip(self.map.iter_mut()) {
                let current = *x;
                *x = current - *clutter;
                *clutter = *clutter * alpha + current * (1.0 - alpha);
            }
        }
    }
}

/// Subtract each range bin's slow-time mean (empties the zero-Doppler row).
fn remove_mean(frame: &mut [Complex32], fast_bins: usize) {
    let pulses = frame.len() / fast_bins.max(1);
    if pulses == 0 {
        return;
    }
    for bin in 0..fast_bins {
        let mut mean = Complex32::new(0.0, 0.0);
        for row in 0..pulses {
            mean += frame[row * fast_bins + bin];
        }
        mean /= pulses as f32;
        for row in 0..pulses {
            frame[row * fast_bins + bin] -= mean;
        }
    }
}
