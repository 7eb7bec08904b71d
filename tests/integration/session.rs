//! Session lifecycle tests
//!
//! Orchestrator state machine against the loopback backend: device
//! ownership across stop/start, caller-contract errors and failed starts.

use crate::helpers::*;
use pingscope::core::{Error as CoreError, RuntimeMessage};
use pingscope::prelude::*;
use pingscope::{
    AudioGraphOrchestrator, ChirpSynthesizer, ModuleSource, PulseDopplerUnit, SessionConfig,
};
use std::sync::Arc;

fn orchestrator(loopback: &Loopback) -> AudioGraphOrchestrator {
    AudioGraphOrchestrator::new(
        Box::new(loopback.backend()),
        Box::new(PulseDopplerUnit::new()),
        Arc::new(ChirpSynthesizer::default()),
    )
}

fn config() -> SessionConfig {
    SessionConfig::new(test_settings(), DesignConstants::default())
}

/// Second start without a stop is a contract violation; the first session
/// keeps running.
#[test]
fn test_double_start_is_already_running() {
    let loopback = Loopback::default();
    let mut orch = orchestrator(&loopback);

    orch.start(&config()).unwrap();
    let err = orch.start(&config()).unwrap_err();
    assert!(matches!(err, CoreError::AlreadyRunning));
    assert!(!err.is_retryable());

    assert_eq!(orch.state(), SessionState::Running);
    assert_eq!(loopback.state().outputs_opened, 1);
    assert_eq!(loopback.state().inputs_opened, 1);
}

/// Stop while uninitialized fails and touches no device.
#[test]
fn test_stop_while_uninitialized() {
    let loopback = Loopback::default();
    let mut orch = orchestrator(&loopback);

    assert!(matches!(orch.stop(), Err(CoreError::NotInitialized)));
    assert_eq!(orch.state(), SessionState::Uninitialized);

    let state = loopback.state();
    assert_eq!(state.outputs_opened + state.inputs_opened, 0);
    assert_eq!(state.pauses, 0);
}

#[test]
fn test_resume_keeps_devices_and_unit() {
    let loopback = Loopback::default();
    let mut orch = orchestrator(&loopback);

    orch.start(&config()).unwrap();
    orch.stop().unwrap();
    orch.stop().unwrap();
    assert_eq!(orch.state(), SessionState::Suspended);
    assert!(!loopback.capture(&[0.0; 64], 2));

    orch.start(&config()).unwrap();
    assert_eq!(orch.state(), SessionState::Running);
    assert!(loopback.capture(&[0.0; 64], 2));

    let state = loopback.state();
    assert_eq!(state.outputs_opened, 1);
    assert_eq!(state.inputs_opened, 1);
    assert_eq!(state.pauses, 2);
    assert_eq!(state.resumes, 2);
    assert_eq!(orch.sessions_opened(), 1);
}

#[test]
fn test_capture_is_raw_stereo_at_output_rate() {
    let loopback = Loopback::default();
    let mut orch = orchestrator(&loopback);
    orch.start(&config()).unwrap();

    let state = loopback.state();
    let constraints = state.last_constraints.unwrap();
    assert!(constraints.is_raw());
    assert_eq!(constraints.channels, 2);

    let request = state.last_request.as_ref().unwrap();
    assert_eq!(constraints.sample_rate, request.sample_rate);
    assert_eq!(request.waveform.len(), 512);
}

#[test]
fn test_failed_start_is_retryable_without_leaks() {
    for fault in [Fault::Output, Fault::Input] {
        let loopback = Loopback::default();
        let mut orch = orchestrator(&loopback);

        loopback.inject(fault);
        let err = orch.start(&config()).unwrap_err();
        assert!(matches!(err, CoreError::DeviceAcquisition(_)), "{fault:?}");
        assert!(err.is_retryable());
        assert_eq!(orch.state(), SessionState::Uninitialized);
        assert_eq!(loopback.state().live_streams(), 0, "{fault:?}");

        orch.start(&config()).unwrap();
        assert_eq!(orch.state(), SessionState::Running);
        assert_eq!(loopback.state().live_streams(), 2);
    }
}

#[test]
fn test_missing_module_file_fails_with_module_load() {
    let loopback = Loopback::default();
    let mut orch = orchestrator(&loopback);
    let config = config().with_module(ModuleSource::File("/nonexistent/unit.bin".into()));

    let err = orch.start(&config).unwrap_err();
    assert!(matches!(err, CoreError::ModuleLoad(_)));
    assert!(err.is_retryable());
    assert_eq!(loopback.state().live_streams(), 0);
}

#[test]
fn test_granted_rate_rederives_parameters() {
    let loopback = Loopback::default();
    loopback.grant_rate(48_000);
    let mut orch = orchestrator(&loopback);

    let derived = orch.start(&config()).unwrap();
    assert_eq!(derived.sample_rate, 48_000.0);
    assert_eq!(derived.decimation_factor, 9);
    assert_eq!(derived.fast_bins, 57);
    assert_eq!(orch.derived(), Some(&derived));
    assert_eq!(loopback.state().last_constraints.unwrap().sample_rate, 48_000);
}

/// A granted rate that puts the carrier above Nyquist can never work, so it
/// is refused before any device opens and is not retryable.
#[test]
fn test_carrier_above_granted_nyquist_is_invalid_settings() {
    let loopback = Loopback::default();
    loopback.grant_rate(32_000);
    let mut orch = orchestrator(&loopback);
    let config = SessionConfig::new(
        test_settings().with_center_frequency(20_000),
        DesignConstants::default(),
    );

    let err = orch.start(&config).unwrap_err();
    assert!(matches!(err, CoreError::InvalidSettings(_)), "{err:?}");
    assert!(!err.is_retryable());
    assert_eq!(orch.state(), SessionState::Uninitialized);

    let state = loopback.state();
    assert_eq!(state.outputs_opened + state.inputs_opened, 0);
    assert_eq!(state.live_streams(), 0);
}

#[test]
fn test_close_releases_everything() {
    let loopback = Loopback::default();
    let mut orch = orchestrator(&loopback);
    let seen = Arc::new(parking_lot::Mutex::new(Vec::<RuntimeMessage>::new()));
    let sink = Arc::clone(&seen);
    orch.set_message_handler(move |m| sink.lock().push(m));

    orch.start(&config()).unwrap();
    orch.close();
    assert_eq!(orch.state(), SessionState::Closed);
    assert_eq!(loopback.state().live_streams(), 0);
    assert!(!loopback.capture_echo(0, 5));
    assert_eq!(orch.pump(), 0);
    assert!(seen.lock().is_empty());

    orch.start(&config()).unwrap();
    assert_eq!(orch.sessions_opened(), 2);
    drop(orch);
    assert_eq!(loopback.state().live_streams(), 0);
}
