//! Post-hoc deadline guard around per-cycle device calls.
//!
//! The vendor transport offers no cancellable I/O, so a stuck call can
//! not be aborted. What can be guaranteed is that a late result is never
//! acted upon: the guard measures each call and converts a late success
//! into [`DeviceError::DeadlineExceeded`].

use std::time::{Duration, Instant};

use tracing::debug;

use exo_common::config::IoConfig;

use crate::device::{AnkleTransport, CurrentGains, DeviceError};
use crate::frame::RawSensorFrame;

/// Deadlines and the per-cycle retry budget for device calls.
#[derive(Debug, Clone, Copy)]
pub struct DeadlinePolicy {
    pub read_deadline: Duration,
    pub write_deadline: Duration,
    /// Retries allowed within one cycle before the thread gives up.
    pub max_retries: u32,
}

impl DeadlinePolicy {
    pub fn from_config(io: &IoConfig) -> Self {
        Self {
            read_deadline: Duration::from_micros(io.read_deadline_us),
            write_deadline: Duration::from_micros(io.write_deadline_us),
            max_retries: io.max_retries,
        }
    }
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self::from_config(&IoConfig::default())
    }
}

/// A transport wrapped with per-call deadline measurement.
///
/// Lifecycle calls (`open`, `start_streaming`, `set_gains`, `stop_motor`,
/// `close`) pass through unguarded; only the per-cycle calls are timed.
pub struct GuardedTransport {
    inner: Box<dyn AnkleTransport>,
    policy: DeadlinePolicy,
}

impl GuardedTransport {
    pub fn new(inner: Box<dyn AnkleTransport>, policy: DeadlinePolicy) -> Self {
        Self { inner, policy }
    }

    #[inline]
    pub fn device_id(&self) -> u32 {
        self.inner.device_id()
    }

    #[inline]
    pub fn policy(&self) -> &DeadlinePolicy {
        &self.policy
    }

    pub fn open(&mut self) -> Result<(), DeviceError> {
        self.inner.open()
    }

    pub fn close(&mut self) -> Result<(), DeviceError> {
        self.inner.close()
    }

    pub fn start_streaming(&mut self, frequency_hz: u32) -> Result<(), DeviceError> {
        self.inner.start_streaming(frequency_hz)
    }

    pub fn set_gains(&mut self, gains: &CurrentGains) -> Result<(), DeviceError> {
        self.inner.set_gains(gains)
    }

    pub fn stop_motor(&mut self) -> Result<(), DeviceError> {
        self.inner.stop_motor()
    }

    /// Timed sensor read. A frame that arrives late is discarded as
    /// [`DeviceError::DeadlineExceeded`] rather than acted upon.
    pub fn read(&mut self) -> Result<RawSensorFrame, DeviceError> {
        let started = Instant::now();
        let result = self.inner.read();
        self.check_deadline(result, started.elapsed(), self.policy.read_deadline)
    }

    /// Timed current command. The command may have reached the device
    /// even when this returns `DeadlineExceeded`; commands are idempotent
    /// so the caller simply re-issues on retry.
    pub fn command_current(&mut self, milliamps: i32) -> Result<(), DeviceError> {
        let started = Instant::now();
        let result = self.inner.command_current(milliamps);
        self.check_deadline(result, started.elapsed(), self.policy.write_deadline)
    }

    fn check_deadline<T>(
        &self,
        result: Result<T, DeviceError>,
        elapsed: Duration,
        deadline: Duration,
    ) -> Result<T, DeviceError> {
        match result {
            Ok(value) if elapsed <= deadline => Ok(value),
            Ok(_) => {
                debug!(
                    "device {} call late: {} µs over a {} µs deadline",
                    self.inner.device_id(),
                    elapsed.as_micros(),
                    deadline.as_micros()
                );
                Err(DeviceError::DeadlineExceeded {
                    deadline_us: deadline.as_micros() as u64,
                    elapsed_us: elapsed.as_micros() as u64,
                })
            }
            Err(e) => Err(e),
        }
    }
}
