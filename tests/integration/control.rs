//! Control surface tests
//!
//! Settings edits recompute the readout at once; structural changes reach
//! the audio session only through a stop/start cycle.

use crate::helpers::*;
use pingscope::core::Error as CoreError;
use pingscope::prelude::*;
use pingscope::PingscopeConfig;

#[test]
fn test_readout_tracks_settings_immediately() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());
    assert_eq!(surface.readout()[0].to_string(), "Bandwidth: 4000 Hz");

    surface
        .apply_settings(test_settings().with_bandwidth_index(2))
        .unwrap();
    assert_eq!(surface.readout()[0].to_string(), "Bandwidth: 5700 Hz");
    assert_eq!(surface.derived().decimation_factor, 5);
    assert_eq!(surface.renderer().dimensions(), Some((103, 5)));
}

#[test]
fn test_invalid_settings_are_rejected() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());

    let even = SonarSettings {
        slow_pulse_count: 6,
        ..test_settings()
    };
    let err = surface.apply_settings(even).unwrap_err();
    assert!(matches!(err.core(), Some(CoreError::InvalidSettings(_))));
    assert_eq!(surface.settings(), &test_settings());
}

#[test]
fn test_change_while_running_is_deferred() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());

    surface.start().unwrap();
    assert_eq!(surface.renderer().dimensions(), Some((64, 5)));

    surface
        .apply_settings(test_settings().with_slow_pulse_count(7))
        .unwrap();
    assert!(surface.is_reconfigure_pending());
    assert_eq!(surface.derived().slow_pulse_count, 7);
    assert_eq!(surface.session_derived().unwrap().slow_pulse_count, 5);

    // The running session still produces frames the renderer accepts
    assert!(loopback.capture_echo(16, 5));
    surface.pump();
    assert_eq!(surface.frames_drawn(), 1);
    assert_eq!(surface.frames_rejected(), 0);
    assert_eq!(surface.renderer().dimensions(), Some((64, 5)));

    surface.stop().unwrap();
    assert!(surface.is_reconfigure_pending());

    let derived = surface.start().unwrap();
    assert_eq!(derived.slow_pulse_count, 7);
    assert!(!surface.is_reconfigure_pending());
    assert_eq!(surface.renderer().dimensions(), Some((64, 7)));

    let state = loopback.state();
    assert_eq!(state.outputs_opened, 2);
    assert_eq!(state.inputs_opened, 2);
    assert_eq!(state.live_streams(), 2);
}

#[test]
fn test_stop_start_without_changes_resumes() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());

    surface.start().unwrap();
    surface.apply_settings(test_settings()).unwrap();
    assert!(!surface.is_reconfigure_pending());

    surface.stop().unwrap();
    assert_eq!(surface.state(), SessionState::Suspended);
    surface.start().unwrap();
    assert_eq!(surface.state(), SessionState::Running);
    assert_eq!(loopback.state().outputs_opened, 1);
}

#[test]
fn test_close_applies_pending_dimensions() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());

    surface.start().unwrap();
    surface
        .apply_settings(test_settings().with_slow_pulse_count(9))
        .unwrap();
    surface.close();

    assert_eq!(surface.state(), SessionState::Closed);
    assert!(!surface.is_reconfigure_pending());
    assert_eq!(surface.renderer().dimensions(), Some((64, 9)));
    assert_eq!(loopback.state().live_streams(), 0);
}

#[test]
fn test_failed_start_can_be_retried() {
    let loopback = Loopback::default();
    let mut surface = test_surface(&loopback, test_settings());

    loopback.inject(Fault::Input);
    let err = surface.start().unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(surface.state(), SessionState::Uninitialized);

    surface.start().unwrap();
    assert_eq!(surface.state(), SessionState::Running);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let mut config = PingscopeConfig::default();
    config.audio.transmit_amplitude = 2.0;

    let result = ControlSurface::builder()
        .config(config)
        .backend(Loopback::default().backend())
        .build();
    let Err(err) = result else {
        panic!("amplitude 2.0 accepted");
    };
    assert!(matches!(err.core(), Some(CoreError::InvalidConfig(_))));
}
