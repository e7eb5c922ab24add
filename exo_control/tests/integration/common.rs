//! Shared fixtures for the integration suite.
//!
//! Every scenario runs a real [`ActuatorControlThread`] on its own OS
//! thread against a [`SimulatedExo`], so the helpers here concentrate
//! on session plumbing and on polling for asynchronous state changes
//! with bounded waits.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use exo_common::config::{IoConfig, RatesConfig, SessionConfig, ZeroingConfig};
use exo_common::estimate::{EstimateSlot, GaitEstimate, SessionClock};
use exo_common::state::{LifecycleCell, LifecycleState, SessionSignals};
use exo_hal::sim::{SimProbe, SimulatedExo};

use exo_control::actuator::ActuatorControlThread;
use exo_control::error::ControlError;
use exo_control::scheduler::CycleStats;
use exo_control::telemetry::{SessionHandle, TelemetrySink};

/// Upper bound for any single asynchronous wait in the suite.
pub const LONG_WAIT: Duration = Duration::from_secs(20);

/// Session configuration tuned for test wall time.
///
/// The control rate is raised so calibration's sample-count-driven
/// stillness window fills in well under a second, the belt spool is
/// shortened to a token interval, and the per-call I/O deadlines are
/// widened so a preempted test runner never trips a spurious
/// `DeadlineExceeded`.
pub fn fast_config(control_rate_hz: f64) -> SessionConfig {
    SessionConfig {
        rates: RatesConfig {
            control_rate_hz,
            ..Default::default()
        },
        zeroing: ZeroingConfig {
            spool_duration_s: 0.01,
            ..Default::default()
        },
        io: IoConfig {
            read_deadline_us: 50_000,
            write_deadline_us: 50_000,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// One session's worth of shared plumbing.
pub struct SessionFixture {
    pub config: SessionConfig,
    pub signals: Arc<SessionSignals>,
    pub handle: Arc<SessionHandle>,
    pub clock: SessionClock,
    pub calibration_dir: TempDir,
}

impl SessionFixture {
    pub fn new(control_rate_hz: f64) -> Self {
        let signals = Arc::new(SessionSignals::new());
        let sink = Arc::new(TelemetrySink::new());
        let handle = Arc::new(SessionHandle::new(Arc::clone(&signals), sink));
        Self {
            config: fast_config(control_rate_hz),
            signals,
            handle,
            clock: SessionClock::start(),
            calibration_dir: TempDir::new().expect("create calibration dir"),
        }
    }

    /// Launch one actuator thread over the given simulated device.
    pub fn spawn(&self, sim: SimulatedExo) -> RunningActuator {
        let probe = sim.probe();
        let estimates = Arc::new(EstimateSlot::new());
        let lifecycle = Arc::new(LifecycleCell::new());

        let config = self.config.clone();
        let clock = self.clock;
        let handle = Arc::clone(&self.handle);
        let slot = Arc::clone(&estimates);
        let cell = Arc::clone(&lifecycle);
        let dir = self.calibration_dir.path().to_path_buf();
        let join = thread::spawn(move || {
            let mut actuator = ActuatorControlThread::new(
                &config,
                Box::new(sim),
                clock,
                slot,
                handle,
                cell,
                &dir,
            )?;
            actuator.run()
        });

        RunningActuator {
            probe,
            estimates,
            lifecycle,
            join,
        }
    }
}

/// Handles onto one spawned actuator thread.
pub struct RunningActuator {
    pub probe: SimProbe,
    pub estimates: Arc<EstimateSlot>,
    pub lifecycle: Arc<LifecycleCell>,
    pub join: JoinHandle<Result<CycleStats, ControlError>>,
}

impl RunningActuator {
    /// Poll until the thread reaches `state`; false on timeout.
    pub fn wait_for_state(&self, state: LifecycleState, timeout: Duration) -> bool {
        wait_until(timeout, || self.lifecycle.load() == state)
    }

    pub fn publish(&self, estimate: GaitEstimate) {
        self.estimates.publish(estimate);
    }

    /// Join the thread and surface its exit result.
    pub fn finish(self) -> Result<CycleStats, ControlError> {
        self.join.join().expect("actuator thread panicked")
    }
}

/// Poll `condition` every millisecond until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
