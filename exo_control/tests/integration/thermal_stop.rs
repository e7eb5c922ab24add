//! Integration test: thermal hard latch and session-wide stop.
//!
//! Validates the protection lifecycle:
//! 1. Case over the hard limit → latch, zero command, shutdown request
//! 2. Every subsequent command on the hot side is exactly zero
//! 3. The peer side drains through bias to a clean stop

use exo_common::fault::CycleFault;
use exo_common::state::{LifecycleState, SessionMode, Side};
use exo_hal::sim::SimulatedExo;

use crate::integration::common::{wait_until, SessionFixture, LONG_WAIT};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn case_over_limit_stops_the_session() {
    let fixture = SessionFixture::new(8_000.0);
    let left = fixture.spawn(SimulatedExo::new(888));
    let right = fixture.spawn(SimulatedExo::new(77));

    assert!(left.wait_for_state(LifecycleState::Paused, LONG_WAIT));
    assert!(right.wait_for_state(LifecycleState::Paused, LONG_WAIT));
    fixture.signals.set_mode(SessionMode::Running);

    // Both sides hold the 2.0 Nm floor torque at the resting pose:
    // 2.0 / (18.0 · 0.9 · 0.000146) truncates to 845 mA.
    assert!(wait_until(LONG_WAIT, || {
        left.probe.last_command() == Some(-845) && right.probe.last_command() == Some(-845)
    }));

    // Cook the left case past the 80 °C hard limit.
    left.probe.set_case_temperature(81);

    assert!(
        left.wait_for_state(LifecycleState::Stopped, LONG_WAIT),
        "hot side must latch and stop"
    );
    assert!(
        right.wait_for_state(LifecycleState::Stopped, LONG_WAIT),
        "peer side must follow the session shutdown"
    );
    assert_eq!(fixture.signals.mode(), SessionMode::Shutdown);

    // From the first zero on, the hot side never energizes again.
    let commands = left.probe.commands();
    let first_zero = commands
        .iter()
        .position(|&ma| ma == 0)
        .expect("latched side must command zero");
    assert!(commands[..first_zero].contains(&-845));
    assert!(
        commands[first_zero..].iter().all(|&ma| ma == 0),
        "latched side issued a non-zero command after the latch"
    );

    // The cool side still gets its ordered bias-then-zero drain.
    let right_commands = right.probe.commands();
    assert!(
        right_commands.ends_with(&[-500, 0]),
        "peer drain must settle at bias before zeroing, got {:?}",
        &right_commands[right_commands.len().saturating_sub(4)..]
    );

    let faults = fixture
        .handle
        .sink()
        .latest(Side::Left)
        .expect("hot side recorded cycles")
        .faults;
    assert!(faults.contains(CycleFault::THERMAL_HARD_CASE));

    for actuator in [left, right] {
        assert!(actuator.probe.stop_calls() >= 1);
        assert!(!actuator.probe.is_open());
        // The latch commands an orderly stop, not a thread failure.
        actuator.finish().expect("thermal stop is a clean exit");
    }
}
