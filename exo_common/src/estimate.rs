//! Gait estimate exchange between the estimator and control threads.
//!
//! The estimator publishes a small `Copy` struct; each control thread
//! snapshots it once per cycle. The slot is last-writer-wins with no
//! history, so a slow consumer only ever skips estimates, never blocks
//! the producer.

use std::time::Instant;

use parking_lot::Mutex;

/// Monotonic session clock all timestamps are measured against.
///
/// Cloned into every thread; the estimator stamps heel strikes with it
/// and control threads compute elapsed stride time from the same origin.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Seconds elapsed since the session started.
    #[inline]
    pub fn now_s(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// One gait estimate as produced by the estimator.
///
/// All times are session-relative seconds from [`SessionClock`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitEstimate {
    /// Time of the most recent heel strike [s].
    pub heel_strike_s: f64,
    /// Duration of the current stride [s].
    pub stride_period_s: f64,
    /// Peak assistance torque requested for this stride [Nm].
    pub peak_torque_nm: f64,
    /// Whether the foot is currently in swing.
    pub in_swing: bool,
}

impl Default for GaitEstimate {
    /// Neutral estimate used before the estimator has published anything.
    ///
    /// Swing with zero peak keeps the actuator at holding torque.
    fn default() -> Self {
        Self {
            heel_strike_s: 0.0,
            stride_period_s: 1.0,
            peak_torque_nm: 0.0,
            in_swing: true,
        }
    }
}

impl GaitEstimate {
    /// Elapsed time into the current stride at `now_s`, clamped at zero
    /// for heel strikes stamped ahead of the reader's clock sample.
    #[inline]
    pub fn elapsed_since_heel_strike(&self, now_s: f64) -> f64 {
        (now_s - self.heel_strike_s).max(0.0)
    }
}

/// Shared slot carrying the freshest [`GaitEstimate`] to one control thread.
///
/// `publish` overwrites unconditionally; `snapshot` copies the current
/// value out under the same short critical section. Neither side holds
/// the lock across any other work.
#[derive(Debug, Default)]
pub struct EstimateSlot {
    inner: Mutex<GaitEstimate>,
}

impl EstimateSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current estimate. Last writer wins.
    #[inline]
    pub fn publish(&self, estimate: GaitEstimate) {
        *self.inner.lock() = estimate;
    }

    /// Copy out the freshest estimate.
    #[inline]
    pub fn snapshot(&self) -> GaitEstimate {
        *self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn default_estimate_is_neutral_swing() {
        let estimate = GaitEstimate::default();
        assert!(estimate.in_swing);
        assert_eq!(estimate.peak_torque_nm, 0.0);
        assert!(estimate.stride_period_s > 0.0);
    }

    #[test]
    fn elapsed_clamps_future_heel_strikes() {
        let estimate = GaitEstimate {
            heel_strike_s: 10.0,
            stride_period_s: 1.0,
            peak_torque_nm: 12.0,
            in_swing: false,
        };
        assert_eq!(estimate.elapsed_since_heel_strike(10.4), 0.4);
        // Reader sampled its clock just before the writer stamped.
        assert_eq!(estimate.elapsed_since_heel_strike(9.9), 0.0);
    }

    #[test]
    fn slot_starts_with_default() {
        let slot = EstimateSlot::new();
        assert_eq!(slot.snapshot(), GaitEstimate::default());
    }

    #[test]
    fn publish_overwrites_previous_value() {
        let slot = EstimateSlot::new();
        slot.publish(GaitEstimate {
            heel_strike_s: 1.0,
            stride_period_s: 1.1,
            peak_torque_nm: 15.0,
            in_swing: false,
        });
        slot.publish(GaitEstimate {
            heel_strike_s: 2.1,
            stride_period_s: 1.2,
            peak_torque_nm: 16.0,
            in_swing: false,
        });
        let seen = slot.snapshot();
        assert_eq!(seen.heel_strike_s, 2.1);
        assert_eq!(seen.peak_torque_nm, 16.0);
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let slot = EstimateSlot::new();
        let before = slot.snapshot();
        slot.publish(GaitEstimate {
            heel_strike_s: 5.0,
            stride_period_s: 1.0,
            peak_torque_nm: 8.0,
            in_swing: false,
        });
        assert_eq!(before, GaitEstimate::default());
    }

    #[test]
    fn concurrent_publish_and_snapshot() {
        let slot = Arc::new(EstimateSlot::new());
        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    slot.publish(GaitEstimate {
                        heel_strike_s: i as f64,
                        stride_period_s: 1.0,
                        peak_torque_nm: i as f64,
                        in_swing: false,
                    });
                }
            })
        };
        // Snapshots must always observe a whole estimate, never a torn one.
        for _ in 0..1000 {
            let seen = slot.snapshot();
            assert_eq!(seen.heel_strike_s, seen.peak_torque_nm);
        }
        writer.join().unwrap();
    }

    #[test]
    fn session_clock_is_monotonic() {
        let clock = SessionClock::start();
        let a = clock.now_s();
        let b = clock.now_s();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}
