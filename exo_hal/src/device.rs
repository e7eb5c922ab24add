//! Ankle transport trait and error types.
//!
//! This module defines:
//! - `AnkleTransport` trait - Interface for pluggable device backends
//! - `DeviceError` enum - Error types for transport operations
//! - `CurrentGains` struct - Gains pushed to the on-device current loop

use thiserror::Error;

use exo_common::config::GainsConfig;

use crate::frame::RawSensorFrame;

/// Error types for transport operations.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    /// Opening the device failed.
    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    /// A call that needs streaming was made before `start_streaming`.
    #[error("Device is not streaming")]
    NotStreaming,

    /// A sensor read failed.
    #[error("Sensor read failed: {0}")]
    ReadFailed(String),

    /// A command write failed.
    #[error("Command write failed: {0}")]
    WriteFailed(String),

    /// The call returned, but only after its deadline had passed.
    #[error("Device call took {elapsed_us} µs, deadline {deadline_us} µs")]
    DeadlineExceeded { deadline_us: u64, elapsed_us: u64 },

    /// The device handle was already closed.
    #[error("Device is closed")]
    Closed,
}

/// Gains for the on-device current controller.
///
/// `k1`/`k2` are the position-loop terms of the six-gain wire format and
/// stay zero under current control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentGains {
    pub kp: u16,
    pub ki: u16,
    pub kd: u16,
    pub k1: u16,
    pub k2: u16,
    pub ff: u16,
}

impl From<&GainsConfig> for CurrentGains {
    fn from(config: &GainsConfig) -> Self {
        Self {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            k1: config.k1,
            k2: config.k2,
            ff: config.ff,
        }
    }
}

impl Default for CurrentGains {
    fn default() -> Self {
        Self::from(&GainsConfig::default())
    }
}

/// Trait defining the interface to one ankle actuator.
///
/// The control thread owns its transport exclusively; no call on this
/// trait is made from more than one thread.
///
/// # Lifecycle
///
/// 1. `open()` - Called once during thread setup
/// 2. `start_streaming(hz)` / `set_gains(..)` - Once, still pre-cycle
/// 3. `read()` / `command_current(ma)` - Every cycle
/// 4. `stop_motor()` / `close()` - Ordered shutdown
///
/// # Timing Contracts
///
/// | Operation | Constraint |
/// |-----------|------------|
/// | `open()`, `start_streaming()`, `set_gains()` | None (pre-cycle) |
/// | `read()`, `command_current()` | Must not block past the cycle deadline |
/// | `stop_motor()`, `close()` | None (post-cycle) |
pub trait AnkleTransport: Send {
    /// Transport id the device reports, used for identity lookup.
    fn device_id(&self) -> u32;

    /// Open the device handle.
    fn open(&mut self) -> Result<(), DeviceError>;

    /// Release the device handle. Idempotent.
    fn close(&mut self) -> Result<(), DeviceError>;

    /// Ask the device to stream sensor frames at `frequency_hz`.
    fn start_streaming(&mut self, frequency_hz: u32) -> Result<(), DeviceError>;

    /// Push current-loop gains to the device controller.
    fn set_gains(&mut self, gains: &CurrentGains) -> Result<(), DeviceError>;

    /// Read the freshest sensor frame.
    fn read(&mut self) -> Result<RawSensorFrame, DeviceError>;

    /// Command a winding current [mA], already in the device sign frame.
    fn command_current(&mut self, milliamps: i32) -> Result<(), DeviceError>;

    /// Zero the winding current and let the motor spin free.
    fn stop_motor(&mut self) -> Result<(), DeviceError>;
}
