//! End-to-end pipeline tests
//!
//! Transmit pulse -> loopback capture -> built-in pulse-Doppler unit ->
//! relay -> renderer, driven by hand one capture buffer at a time.

use crate::helpers::*;
use pingscope::prelude::*;

/// Static echo 16 samples late: zero Doppler (center row) at range bin
/// 16 / decimation.
#[test]
fn test_static_echo_lands_on_zero_doppler_row() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());
    let derived = surface.start().unwrap();

    assert!(loopback.capture_echo(16, 5));
    assert!(surface.pump() >= 1);
    assert_eq!(surface.frames_drawn(), 1);
    assert!(surface.last_frame_max() > 0.0);

    let peak = surface.peak_level();
    assert!(peak > 0.1 && peak <= 1.0, "peak {peak}");

    let renderer = surface.renderer();
    let buffer = renderer.buffer().unwrap();
    let range_bin = 16 / derived.decimation_factor;
    let center_row = derived.slow_pulse_count / 2;
    assert_eq!(buffer.intensity(range_bin, center_row), Some(255));
}

#[test]
fn test_offset_compensation_pulls_direct_path_to_range_zero() {
    let loopback = Loopback::default();
    let settings = test_settings().with_offset_compensation(true);
    let mut surface = test_surface(&loopback, settings);
    let derived = surface.start().unwrap();

    assert!(loopback.capture_echo(40, 5));
    surface.pump();

    let renderer = surface.renderer();
    let buffer = renderer.buffer().unwrap();
    assert_eq!(buffer.intensity(0, derived.slow_pulse_count / 2), Some(255));
}

#[test]
fn test_clutter_filter_suppresses_static_echo() {
    let max_for = |mode: ClutterFilterMode| {
        let loopback = Loopback::default();
        let mut surface = test_surface(&loopback, test_settings().with_clutter_filter(mode));
        surface.start().unwrap();
        assert!(loopback.capture_echo(16, 5));
        surface.pump();
        assert_eq!(surface.frames_drawn(), 1);
        surface.last_frame_max()
    };

    let raw = max_for(ClutterFilterMode::None);
    let filtered = max_for(ClutterFilterMode::RemoveZeroDoppler);
    assert!(filtered < raw * 1e-3, "{filtered} vs {raw}");
}

#[test]
fn test_no_frames_while_suspended() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());
    surface.start().unwrap();
    surface.stop().unwrap();

    assert!(!loopback.capture_echo(16, 5));
    assert_eq!(surface.pump(), 0);
    assert_eq!(surface.frames_drawn(), 0);

    surface.start().unwrap();
    assert!(loopback.capture_echo(16, 5));
    surface.pump();
    assert_eq!(surface.frames_drawn(), 1);
}

#[cfg(feature = "png")]
/// A pulse and a half captured before the pause must not shift the pulse
/// boundaries after it: the next frame needs a full set of fresh pulses.
#[test]
fn test_resume_starts_from_a_pulse_boundary() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());
    let derived = surface.start().unwrap();
    let pulse_len = derived.chirp_length_samples;

    let junk: Vec<f32> = (0..pulse_len * 3 / 2)
        .flat_map(|n| [if n % 2 == 0 { 0.7 } else { -0.7 }, 0.0])
        .collect();
    assert!(loopback.capture(&junk, 2));
    surface.stop().unwrap();
    surface.start().unwrap();

    assert!(loopback.capture_echo(16, derived.slow_pulse_count - 1));
    surface.pump();
    assert_eq!(surface.frames_drawn(), 0);

    assert!(loopback.capture_echo(16, 1));
    surface.pump();
    assert_eq!(surface.frames_drawn(), 1);

    let renderer = surface.renderer();
    let buffer = renderer.buffer().unwrap();
    let range_bin = 16 / derived.decimation_factor;
    assert_eq!(
        buffer.intensity(range_bin, derived.slow_pulse_count / 2),
        Some(255)
    );
}

#[test]
fn test_png_snapshots_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.png");

    let mut config = PingscopeConfig::default();
    config.settings = test_settings();
    config.render.png_path = Some(path.clone());
    config.render.png_interval = 1;

    let loopback = Loopback::default();
    let mut surface = ControlSurface::builder()
        .config(config)
        .backend(loopback.backend())
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    surface.start().unwrap();

    assert!(loopback.capture_echo(16, 10));
    surface.pump();
    assert_eq!(surface.frames_drawn(), 2);
    assert!(path.exists());
}
