//! Slow-time window, FFT and magnitude.

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Turns a pulse-major frame into a range-Doppler magnitude map with zero
/// Doppler in the centre row.
pub struct DopplerProcessor {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    column: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl DopplerProcessor {
    pub fn new(planner: &mut FftPlanner<f32>, window: &[f32]) -> Self {
        let fft = planner.plan_fft_forward(window.len());
        let scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            window: window.to_vec(),
            column: vec![Complex32::new(0.0, 0.0); window.len()],
            scratch,
        }
    }

    pub fn pulses(&self) -> usize {
        self.window.len()
    }

    /// `out[row * fast_bins + bin]` receives `|X[k]| / pulses`, where row
    /// `pulses / 2` is zero Doppler.
    pub fn process(&mut self, frame: &[Complex32], fast_bins: usize, out: &mut [f32]) {
        let pulses = self.window.len();
        let half = pulses / 2;
        let scale = 1.0 / pulses.max(1) as f32;

        for bin in 0..fast_bins {
            for (row, (c, &w)) in self.column.iter_mut().zip(&self.window).enumerate() {
                *c = frame[row * fast_bins + bin] * w;
            }
            self.fft.process_with_scratch(&mut self.column, &mut self.scratch);

            for (k, c) in self.column.iter().enumerate() {
                let row = (k + half) % pulses;
                out[row * fast_bins + bin] = c.norm() * scale;
            }
        }
    }
}
