//! Integration test: the remote directive surface over a live session.
//!
//! Exercises the vetted boundary between remote clients and a running
//! actuator thread: field reads by name, the per-side peak torque
//! ceiling, the logging switch and sticky shutdown.

use std::thread;
use std::time::Duration;

use exo_common::estimate::GaitEstimate;
use exo_common::state::{LifecycleState, SessionMode, Side};
use exo_hal::sim::SimulatedExo;

use exo_control::telemetry::ControlDirective;

use crate::integration::common::{wait_until, SessionFixture, LONG_WAIT};

// ── Tests ───────────────────────────────────────────────────────────

/// Mid-stance on a near-infinite stride pins the profile at its peak,
/// so the ceiling directive's effect is visible as an exact step down
/// to the floor-torque command.
#[test]
fn ceiling_caps_assistance_mid_session() {
    let fixture = SessionFixture::new(8_000.0);
    let actuator = fixture.spawn(SimulatedExo::new(888));

    assert!(actuator.wait_for_state(LifecycleState::Paused, LONG_WAIT));
    actuator.probe.set_ankle_delta_deg(101.0);
    actuator.publish(GaitEstimate {
        heel_strike_s: fixture.clock.now_s() - 540.0,
        stride_period_s: 1_000.0,
        peak_torque_nm: 15.0,
        in_swing: false,
    });
    fixture.signals.set_mode(SessionMode::Running);

    // Near the full 15 Nm across ratio 10: upwards of 11 A commanded.
    assert!(
        wait_until(LONG_WAIT, || {
            actuator.probe.last_command().is_some_and(|ma| ma <= -5_000)
        }),
        "peak assistance never reached the wire, got {:?}",
        actuator.probe.last_command()
    );
    assert_eq!(
        fixture.handle.read_field(Side::Left, "transmission_ratio"),
        Some(10.0)
    );
    assert_eq!(
        fixture.handle.read_field(Side::Left, "peak_torque_nm"),
        Some(15.0)
    );
    assert_eq!(fixture.handle.read_field(Side::Left, "no_such_field"), None);

    // Capping at the floor torque pins the command to exactly 1522 mA.
    fixture
        .handle
        .apply(ControlDirective::SetPeakTorqueCeiling {
            side: Side::Left,
            nm: 2.0,
        })
        .expect("a finite non-negative ceiling is accepted");
    assert!(
        wait_until(LONG_WAIT, || actuator.probe.last_command() == Some(-1522)),
        "ceiling must step the command down to -1522 mA, got {:?}",
        actuator.probe.last_command()
    );
    assert_eq!(
        fixture.handle.read_field(Side::Left, "peak_torque_nm"),
        Some(2.0),
        "records must carry the capped peak"
    );
    assert_eq!(
        fixture.handle.read_field(Side::Left, "torque_command_nm"),
        Some(2.0)
    );

    fixture.signals.request_shutdown();
    assert!(actuator.wait_for_state(LifecycleState::Stopped, LONG_WAIT));
    actuator.finish().expect("clean exit under a ceiling");
}

#[test]
fn logging_switch_and_sticky_shutdown() {
    let fixture = SessionFixture::new(8_000.0);
    fixture.signals.set_log_enabled(true);
    let actuator = fixture.spawn(SimulatedExo::new(888));

    assert!(actuator.wait_for_state(LifecycleState::Paused, LONG_WAIT));
    fixture.signals.set_mode(SessionMode::Running);
    assert!(actuator.wait_for_state(LifecycleState::Active, LONG_WAIT));
    assert!(
        wait_until(LONG_WAIT, || fixture.handle.sink().pending_len(Side::Left) > 0),
        "records must queue while logging is on"
    );

    // Switching logging off stops the queue but not the live view.
    fixture
        .handle
        .apply(ControlDirective::SetLogging(false))
        .expect("logging switch is always accepted");
    thread::sleep(Duration::from_millis(20));
    let parked_len = fixture.handle.sink().pending_len(Side::Left);
    let before_s = fixture
        .handle
        .read_field(Side::Left, "timestamp_s")
        .expect("live view stays populated");
    thread::sleep(Duration::from_millis(50));
    assert_eq!(
        fixture.handle.sink().pending_len(Side::Left),
        parked_len,
        "queue must not grow with logging off"
    );
    let after_s = fixture
        .handle
        .read_field(Side::Left, "timestamp_s")
        .expect("live view stays populated");
    assert!(
        after_s > before_s,
        "the latest record must keep advancing with logging off"
    );

    // Shutdown wins over any later mode request.
    fixture
        .handle
        .apply(ControlDirective::SetMode(SessionMode::Shutdown))
        .expect("shutdown directive is accepted");
    assert!(actuator.wait_for_state(LifecycleState::Stopped, LONG_WAIT));
    assert!(
        fixture
            .handle
            .apply(ControlDirective::SetMode(SessionMode::Running))
            .is_err(),
        "shutdown must be sticky against a resume request"
    );
    actuator.finish().expect("clean exit");
}
