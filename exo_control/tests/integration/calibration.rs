//! Integration test: encoder zeroing against the simulated hard stop.
//!
//! Validates the calibration workflow end to end:
//! 1. Spool, pull, stillness lock, offsets persisted per side
//! 2. Bias current held once the joint is zeroed
//! 3. Shutdown during the pull aborts cleanly and releases the device

use exo_common::consts::ENC_CLICKS_TO_DEG;
use exo_common::offsets::CalibrationOffsets;
use exo_common::state::{LifecycleState, Side};
use exo_hal::sim::SimulatedExo;

use exo_control::calibration::CalibrationError;
use exo_control::error::ControlError;

use crate::integration::common::{wait_until, SessionFixture, LONG_WAIT};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn zeroing_locks_and_persists_offsets() {
    let fixture = SessionFixture::new(8_000.0);
    let actuator = fixture.spawn(SimulatedExo::new(888));

    assert!(
        actuator.wait_for_state(LifecycleState::Paused, LONG_WAIT),
        "calibration must finish and park the thread at Paused"
    );

    // The lock captured the resting pose as the zero reference.
    let offsets = CalibrationOffsets::load(fixture.calibration_dir.path(), Side::Left)
        .expect("offsets file must exist after a completed calibration");
    let resting_ankle_deg = 2_600.0 * ENC_CLICKS_TO_DEG;
    assert!(
        (offsets.ankle_angle_zero_deg - resting_ankle_deg).abs() < 0.5,
        "ankle zero {} must sit at the resting pose {}",
        offsets.ankle_angle_zero_deg,
        resting_ankle_deg
    );
    assert!(offsets.motor_angle_zero_deg > 0.0);

    // Spool and lock hold bias; the pull carried the configured current.
    let commands = actuator.probe.commands();
    assert!(commands.contains(&-1000), "pull current was never issued");
    assert_eq!(actuator.probe.last_command(), Some(-500));

    fixture.signals.request_shutdown();
    assert!(actuator.wait_for_state(LifecycleState::Stopped, LONG_WAIT));
    assert!(!actuator.probe.is_open(), "device must be released on exit");
    actuator.finish().expect("clean shutdown from Paused");
}

#[test]
fn shutdown_during_pull_aborts_calibration() {
    let fixture = SessionFixture::new(8_000.0);
    let actuator = fixture.spawn(SimulatedExo::new(888).never_settling());

    // Wait until the pull phase is live, then yank the session.
    assert!(
        wait_until(LONG_WAIT, || actuator.probe.commands().contains(&-1000)),
        "pull phase never started"
    );
    fixture.signals.request_shutdown();

    assert!(actuator.wait_for_state(LifecycleState::Stopped, LONG_WAIT));
    assert!(actuator.probe.stop_calls() >= 1, "motor must be stopped");
    assert!(!actuator.probe.is_open(), "device must be released");

    match actuator.finish() {
        Err(ControlError::Calibration(CalibrationError::Interrupted)) => {}
        Err(err) => panic!("unexpected error: {err}"),
        Ok(_) => panic!("interrupted calibration must not report success"),
    }
}
