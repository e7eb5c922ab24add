//! Soft real-time cycle pacing.
//!
//! The scheduler holds an absolute deadline rather than a relative
//! increment: `next_deadline += period` every on-time cycle, so jitter
//! in individual cycles never accumulates into drift. A missed deadline
//! is recorded and the cadence restarts from the current instant; the
//! scheduler never shortens later cycles to catch up.

use std::thread;
use std::time::{Duration, Instant};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
///
/// Updated every cycle with no allocation.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Largest lateness past a deadline [ns].
    pub worst_lateness_ns: i64,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            worst_lateness_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
    }

    /// Record a missed deadline and how late it was.
    #[inline]
    pub fn record_overrun(&mut self, lateness_ns: i64) {
        self.overruns += 1;
        if lateness_ns > self.worst_lateness_ns {
            self.worst_lateness_ns = lateness_ns;
        }
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Scheduler ──────────────────────────────────────────────────────

/// What one wait decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Deadline ahead; sleep this long.
    Slept(Duration),
    /// Deadline already past; cadence restarted from now.
    Overrun { lateness: Duration },
}

impl WaitOutcome {
    #[inline]
    pub const fn is_overrun(&self) -> bool {
        matches!(self, Self::Overrun { .. })
    }
}

/// Absolute-deadline sleeper holding a fixed cycle cadence.
#[derive(Debug)]
pub struct SoftRtScheduler {
    period: Duration,
    next_deadline: Option<Instant>,
    /// Start of the cycle currently executing (intended wake instant).
    cycle_origin: Option<Instant>,
    stats: CycleStats,
}

impl SoftRtScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: None,
            cycle_origin: None,
            stats: CycleStats::new(),
        }
    }

    pub fn from_rate_hz(rate_hz: f64) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / rate_hz))
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Deadline the next wait will honor, once the cadence has started.
    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    /// Decide the wait for the cycle ending at `now`.
    ///
    /// Pure with respect to the wall clock: all timing state advances
    /// from the passed instant, so a replayed instant sequence yields a
    /// replayed decision sequence.
    pub fn plan(&mut self, now: Instant) -> WaitOutcome {
        let deadline = match self.next_deadline {
            Some(deadline) => {
                if let Some(origin) = self.cycle_origin {
                    let duration = now.saturating_duration_since(origin);
                    self.stats.record(duration.as_nanos() as i64);
                }
                deadline
            }
            // First cycle: the cadence starts at the current instant.
            None => now,
        };

        match deadline.checked_duration_since(now) {
            Some(slack) => {
                self.next_deadline = Some(deadline + self.period);
                self.cycle_origin = Some(deadline);
                WaitOutcome::Slept(slack)
            }
            None => {
                let lateness = now.saturating_duration_since(deadline);
                self.stats.record_overrun(lateness.as_nanos() as i64);
                self.next_deadline = Some(now + self.period);
                self.cycle_origin = Some(now);
                WaitOutcome::Overrun { lateness }
            }
        }
    }

    /// Block until the next deadline (or return immediately on overrun).
    pub fn wait(&mut self) -> WaitOutcome {
        let outcome = self.plan(Instant::now());
        if let WaitOutcome::Slept(slack) = outcome {
            if !slack.is_zero() {
                thread::sleep(slack);
            }
        }
        outcome
    }
}
