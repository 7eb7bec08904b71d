//! Parameter model tests
//!
//! The model is a pure function of the knobs and the design constants, so
//! most of these run across the whole knob range with proptest.

use crate::helpers::tolerances::PARAM_EPSILON;
use approx::assert_relative_eq;
use pingscope::core::params::{bandwidth_hz, chirp_length_samples};
use pingscope::core::settings::{BANDWIDTH_INDEX_RANGE, CHIRP_LENGTH_INDEX_RANGE};
use pingscope::prelude::*;
use pingscope::derive;
use proptest::prelude::*;

/// Scenario with an even pulse count: `derive` computes it even though the
/// settings would not validate.
#[test]
fn test_scenario_a_default_knobs() {
    let settings = SonarSettings {
        slow_pulse_count: 20,
        ..SonarSettings::default()
    };
    assert!(settings.validate().is_err());

    let d = derive(&settings, &DesignConstants::default());
    assert_eq!(d.bandwidth_hz, 4000);
    assert_eq!(d.chirp_length_samples, 512);
    assert_eq!(d.decimation_factor, 8);
    assert_eq!(d.fast_bins, 64);
    assert_eq!(d.frame_dimensions(), (64, 20));
    assert_relative_eq!(d.range_resolution_m, 343.0 / 44100.0 * 8.0, epsilon = PARAM_EPSILON);
    assert_relative_eq!(d.cpi_duration_s, 512.0 * 20.0 / 44100.0, epsilon = PARAM_EPSILON);
}

#[test]
fn test_bandwidth_monotonic_multiple_of_100() {
    let values: Vec<u32> = BANDWIDTH_INDEX_RANGE.iter().map(bandwidth_hz).collect();
    assert_eq!(values.len(), 17);
    for v in &values {
        assert!(*v > 0);
        assert_eq!(v % 100, 0);
    }
    assert!(values.windows(2).all(|w| w[0] < w[1]), "{values:?}");
}

#[test]
fn test_chirp_length_monotonic() {
    let values: Vec<usize> = CHIRP_LENGTH_INDEX_RANGE
        .iter()
        .map(chirp_length_samples)
        .collect();
    assert_eq!(values.len(), 19);
    assert!(values[0] > 0);
    assert!(values.windows(2).all(|w| w[0] < w[1]), "{values:?}");
}

#[test]
fn test_fast_bins_identity_over_control_grid() {
    let constants = DesignConstants::default();
    for b in BANDWIDTH_INDEX_RANGE.iter() {
        for c in CHIRP_LENGTH_INDEX_RANGE.iter() {
            let settings = SonarSettings::default()
                .with_bandwidth_index(b)
                .with_chirp_length_index(c);
            let d = derive(&settings, &constants);
            let expected_decimation =
                (constants.sample_rate / (d.bandwidth_hz as f64 * 1.3)).floor() as usize;
            assert_eq!(d.decimation_factor, expected_decimation);
            assert!(d.decimation_factor >= 1, "b={b} c={c}");
            assert_eq!(
                d.fast_bins,
                d.chirp_length_samples.div_ceil(d.decimation_factor),
                "b={b} c={c}"
            );
        }
    }
}

proptest! {
    #[test]
    fn prop_derive_is_idempotent(
        center in 1_000u32..=22_000,
        bandwidth in -8i32..=8,
        chirp in -8i32..=10,
        pulses in 0u32..=100,
        offset in any::<bool>(),
    ) {
        let settings = SonarSettings::default()
            .with_center_frequency(center)
            .with_bandwidth_index(bandwidth)
            .with_chirp_length_index(chirp)
            .with_slow_pulse_count(pulses * 2 + 1)
            .with_offset_compensation(offset);
        let constants = DesignConstants::default();

        let a = derive(&settings, &constants);
        let b = derive(&settings, &constants);
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.frame_len(), a.fast_bins * a.slow_pulse_count);
    }

    #[test]
    fn prop_physical_values_consistent(
        center in 1_000u32..=22_000,
        bandwidth in -8i32..=8,
        chirp in -8i32..=10,
    ) {
        let settings = SonarSettings::default()
            .with_center_frequency(center)
            .with_bandwidth_index(bandwidth)
            .with_chirp_length_index(chirp);
        let d = derive(&settings, &DesignConstants::default());

        prop_assert!((d.pulse_repetition_freq_hz * d.chirp_duration_s - 1.0).abs() < PARAM_EPSILON);
        prop_assert!(
            (d.cpi_duration_s - d.chirp_duration_s * d.slow_pulse_count as f64).abs() < PARAM_EPSILON
        );
        prop_assert!(d.range_resolution_m > 0.0);
        prop_assert!(d.velocity_ambiguity_mps > d.velocity_resolution_mps);
    }
}
