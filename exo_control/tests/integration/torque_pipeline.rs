//! Integration test: the full torque pipeline over one simulated session.
//!
//! Drives an actuator thread from calibration into assistance and
//! validates the chain ankle angle → transmission ratio → profile
//! torque → truncated, clamped, signed current command, plus the
//! standby hold and the ordered shutdown drain.

use std::thread;
use std::time::Duration;

use exo_common::estimate::GaitEstimate;
use exo_common::fault::CycleFault;
use exo_common::state::{LifecycleState, SessionMode, Side};
use exo_hal::sim::SimulatedExo;

use crate::integration::common::{wait_until, SessionFixture, LONG_WAIT};

// ── Helpers ─────────────────────────────────────────────────────────

fn read(fixture: &SessionFixture, name: &str) -> f64 {
    fixture
        .handle
        .read_field(Side::Left, name)
        .unwrap_or_else(|| panic!("field '{name}' missing from the latest record"))
}

// ── Tests ───────────────────────────────────────────────────────────

/// A dorsiflexed ankle deep in the transmission's floor region, a swing
/// estimate holding the floor torque: every number on the wire is
/// predictable to the milliamp.
#[test]
fn assistance_commands_follow_the_ratio_floor() {
    let fixture = SessionFixture::new(8_000.0);
    let actuator = fixture.spawn(SimulatedExo::new(888));

    assert!(actuator.wait_for_state(LifecycleState::Paused, LONG_WAIT));

    // Push the joint 101° past the zeroed pose; the ratio model bottoms
    // out at 10.0 there without flagging, and swing pins the profile at
    // the 2.0 Nm holding torque. 2.0 / (10.0 · 0.9 · 0.000146) = 1522.
    actuator.probe.set_ankle_delta_deg(101.0);
    actuator.publish(GaitEstimate {
        heel_strike_s: fixture.clock.now_s(),
        stride_period_s: 1.0,
        peak_torque_nm: 15.0,
        in_swing: true,
    });
    fixture.signals.set_mode(SessionMode::Running);

    assert!(actuator.wait_for_state(LifecycleState::Active, LONG_WAIT));
    assert!(
        wait_until(LONG_WAIT, || actuator.probe.last_command() == Some(-1522)),
        "left wire command must settle at -1522 mA, got {:?}",
        actuator.probe.last_command()
    );

    assert_eq!(read(&fixture, "transmission_ratio"), 10.0);
    assert_eq!(read(&fixture, "torque_command_nm"), 2.0);
    assert_eq!(read(&fixture, "current_command_ma"), 1522.0);

    // The mirrored motor current closes the loop back to ~2 Nm.
    let delivered = read(&fixture, "delivered_torque_nm");
    assert!(
        (delivered - 2.0).abs() < 0.01,
        "delivered torque {delivered} must track the command"
    );

    let faults = fixture
        .handle
        .sink()
        .latest(Side::Left)
        .expect("records must flow once assistance is live")
        .faults;
    assert!(!faults.contains(CycleFault::RATIO_OUT_OF_RANGE));
    assert!(!faults.contains(CycleFault::COMMAND_CLAMPED));

    // Standby parks the joint at bias with a single command, then goes
    // quiet until the session resumes.
    fixture.signals.set_mode(SessionMode::Standby);
    assert!(actuator.wait_for_state(LifecycleState::Paused, LONG_WAIT));
    assert!(wait_until(LONG_WAIT, || {
        actuator.probe.last_command() == Some(-500)
    }));
    let parked = actuator.probe.command_count();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(
        actuator.probe.command_count(),
        parked,
        "paused threads must not keep commanding"
    );

    fixture.signals.set_mode(SessionMode::Running);
    assert!(
        wait_until(LONG_WAIT, || actuator.probe.last_command() == Some(-1522)),
        "assistance must resume after standby"
    );

    // Ordered teardown: settle at bias, zero the winding, release.
    fixture.signals.request_shutdown();
    assert!(actuator.wait_for_state(LifecycleState::Stopped, LONG_WAIT));
    let commands = actuator.probe.commands();
    assert!(
        commands.ends_with(&[-500, 0]),
        "shutdown must drain through bias to zero, got {:?}",
        &commands[commands.len().saturating_sub(4)..]
    );
    assert!(actuator.probe.stop_calls() >= 1);
    assert!(!actuator.probe.is_open());

    let stats = actuator.finish().expect("clean session exit");
    assert!(stats.cycle_count > 0);
}
