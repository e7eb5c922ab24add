//! Integration test: absolute-deadline pacing under overload.
//!
//! At 40 kHz the nominal period sits far below the sleep granularity,
//! so every cycle lands late. The scheduler must count the overrun,
//! resync to the wall clock and keep the loop productive instead of
//! spiraling on an ever-receding deadline.

use std::thread;
use std::time::Duration;

use exo_common::fault::CycleFault;
use exo_common::state::{LifecycleState, SessionMode, Side};
use exo_hal::sim::SimulatedExo;

use crate::integration::common::{SessionFixture, LONG_WAIT};

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn overruns_are_counted_and_survived() {
    let fixture = SessionFixture::new(40_000.0);
    fixture.signals.set_log_enabled(true);
    let actuator = fixture.spawn(SimulatedExo::new(888));

    assert!(
        actuator.wait_for_state(LifecycleState::Paused, LONG_WAIT),
        "calibration must complete even with every deadline blown"
    );
    fixture.signals.set_mode(SessionMode::Running);
    assert!(actuator.wait_for_state(LifecycleState::Active, LONG_WAIT));
    thread::sleep(Duration::from_millis(200));

    fixture.signals.request_shutdown();
    assert!(actuator.wait_for_state(LifecycleState::Stopped, LONG_WAIT));

    let stats = actuator.finish().expect("overloaded session still exits cleanly");
    assert!(
        stats.cycle_count > 100,
        "loop must stay productive, ran {} cycles",
        stats.cycle_count
    );
    assert!(
        stats.overruns > 0,
        "a 25 µs period must overrun on a stock kernel"
    );
    assert!(stats.worst_lateness_ns > 0);

    // Overruns ride along in the records as warnings, not errors.
    let drained = fixture.handle.sink().drain(Side::Left);
    assert!(
        drained
            .iter()
            .any(|record| record.faults.contains(CycleFault::SCHEDULER_OVERRUN)),
        "no drained record carries the overrun flag"
    );
}
