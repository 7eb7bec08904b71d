//! Circular matched filter in the frequency domain.

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Correlates each decimated pulse against the decimated reference.
///
/// Output bin `k` holds `sum_m x[m] * conj(r[m - k])`, so an echo delayed by
/// `k` bins peaks at bin `k`.
pub struct MatchedFilter {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// conj(FFT(reference)) / N
    reference: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl MatchedFilter {
    pub fn new(planner: &mut FftPlanner<f32>, reference: &[Complex32]) -> Self {
        let n = reference.len();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);

        let mut spectrum = reference.to_vec();
        forward.process(&mut spectrum);
        let scale = 1.0 / n.max(1) as f32;
        for c in &mut spectrum {
            *c = c.conj() * scale;
        }

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            forward,
            inverse,
            reference: spectrum,
            scratch: vec![Complex32::new(0.0, 0.0); scratch_len],
        }
    }

    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// In place; `pulse.len()` must equal the reference length.
    #[inline]
    pub fn apply(&mut self, pulse: &mut [Complex32]) {
        self.forward.process_with_scratch(pulse, &mut self.scratch);
        for (x, r) in pulse.iter_mut().zip(&self.reference) {
            *x *= *r;
        }
        self.inverse.process_with_scratch(pulse, &mut self.scratch);
    }
}
