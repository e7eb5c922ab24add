//! Session-level error taxonomy.
//!
//! Module-local failures (`CalibrationError`, `TransmissionError`,
//! `DeviceError`) convert into [`ControlError`] at the thread boundary.
//! Everything here is fatal to the actuator thread that raised it;
//! per-cycle recoverable conditions travel as `CycleFault` flags in the
//! record instead.

use thiserror::Error;

use exo_common::config::ConfigError;
use exo_hal::device::DeviceError;

use crate::calibration::CalibrationError;
use crate::transmission::TransmissionError;

/// Fatal error of one actuator control thread.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Device identity is not in the configured table.
    #[error("unknown device identity {device_id}")]
    UnknownDevice { device_id: u32 },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("transmission model error: {0}")]
    Transmission(#[from] TransmissionError),

    /// Real-time setup system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),
}
