//! Complex down-mix and box-car decimation of one pulse period.

use core::f64::consts::PI;
use rustfft::num_complex::Complex32;

/// Mixes one pulse period to baseband and averages it into fast-time bins.
///
/// The mixer phase restarts at every pulse, so a static echo produces the
/// same baseband pulse every period.
pub struct PulseBaseband {
    mixer: Vec<Complex32>,
    decimation: usize,
    fast_bins: usize,
}

impl PulseBaseband {
    pub fn new(pulse_len: usize, normalized_carrier: f64, decimation: usize) -> Self {
        let decimation = decimation.max(1);
        let mixer = (0..pulse_len)
            .map(|n| {
                let phase = -2.0 * PI * normalized_carrier * n as f64;
                Complex32::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect();

        Self {
            mixer,
            decimation,
            fast_bins: pulse_len.div_ceil(decimation),
        }
    }

    pub fn pulse_len(&self) -> usize {
        self.mixer.len()
    }

    pub fn fast_bins(&self) -> usize {
        self.fast_bins
    }

    /// `pulse` is one period of real samples; `out` receives `fast_bins`
    /// values. The last bin averages whatever samples remain.
    #[inline]
    pub fn process(&self, pulse: &[f32], out: &mut [Complex32]) {
        debug_assert_eq!(pulse.len(), self.mixer.len());
        debug_assert_eq!(out.len(), self.fast_bins);

        let mixed = pulse.chunks(self.decimation).zip(self.mixer.chunks(self.decimation));
        for (bin, (samples, mixer)) in out.iter_mut().zip(mixed) {
            let mut acc = Complex32::new(0.0, 0.0);
            for (&s, &m) in samples.iter().zip(mixer) {
                acc += m * s;
            }
            *bin = acc / samples.len() as f32;
        }
    }
}
