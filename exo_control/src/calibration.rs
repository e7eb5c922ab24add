//! Encoder zeroing at session start.
//!
//! Both encoders power up with arbitrary reference frames, so before
//! assistance can run each side pulls its ankle against the hard stop
//! and locks the angles seen there as the session's zero pair. The
//! procedure has two phases: a short spool at bias current to take up
//! belt slack, then a constant pull while a moving window watches both
//! velocity channels. When the window is full and the fraction of
//! moving samples drops under the configured threshold, the joint is
//! declared still and the windowed angle averages become the offsets.
//!
//! The window must saturate before a lock is possible, so a side is
//! never zeroed on less than a full window of evidence. A side that
//! never settles runs into the timeout budget instead of pulling
//! forever.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use exo_common::config::{RatesConfig, ZeroingConfig};
use exo_common::consts::{BIAS_CURRENT_MA, ZEROING_WINDOW};
use exo_common::filter::MovingAverage;
use exo_common::offsets::{CalibrationOffsets, OffsetsError};
use exo_common::state::SessionSignals;
use exo_hal::deadline::GuardedTransport;
use exo_hal::device::DeviceError;
use exo_hal::identity::DeviceIdentity;

use crate::scheduler::SoftRtScheduler;

/// Failure of the zeroing procedure. All variants end the session for
/// the side that raised them.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Stillness never held within the pull budget.
    #[error("zeroing did not settle within {budget_s} s")]
    Timeout { budget_s: f64 },

    /// Shutdown was requested while zeroing was still in progress.
    #[error("zeroing interrupted by shutdown")]
    Interrupted,

    #[error("device error during zeroing: {0}")]
    Device(#[from] DeviceError),

    #[error("offsets persistence failed: {0}")]
    Persist(#[from] OffsetsError),
}

/// Drives one side through spool, pull, lock and offset persistence.
pub struct CalibrationSupervisor {
    zeroing: ZeroingConfig,
    control_rate_hz: f64,
    identity: DeviceIdentity,
    out_dir: PathBuf,
}

impl CalibrationSupervisor {
    pub fn new(
        zeroing: &ZeroingConfig,
        rates: &RatesConfig,
        identity: DeviceIdentity,
        out_dir: &Path,
    ) -> Self {
        Self {
            zeroing: *zeroing,
            control_rate_hz: rates.control_rate_hz,
            identity,
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Run the full procedure and persist the locked offsets.
    ///
    /// Paces itself at the control rate; returns once the joint locked,
    /// the budget ran out, shutdown was requested or the device failed.
    /// The motor is left holding bias current on success and stopped on
    /// every error path.
    pub fn run(
        &self,
        transport: &mut GuardedTransport,
        signals: &SessionSignals,
    ) -> Result<CalibrationOffsets, CalibrationError> {
        match self.zero(transport, signals) {
            Ok(offsets) => Ok(offsets),
            Err(err) => {
                if let Err(stop_err) = transport.stop_motor() {
                    warn!("motor stop after failed zeroing also failed: {stop_err}");
                }
                Err(err)
            }
        }
    }

    fn zero(
        &self,
        transport: &mut GuardedTransport,
        signals: &SessionSignals,
    ) -> Result<CalibrationOffsets, CalibrationError> {
        let side = self.identity.side;
        let spool_samples = (self.zeroing.spool_duration_s * self.control_rate_hz).ceil() as u64;
        let budget_samples = (self.zeroing.timeout_s * self.control_rate_hz).ceil() as u64;
        let mut scheduler = SoftRtScheduler::from_rate_hz(self.control_rate_hz);

        info!(
            "zeroing {side}: spooling belt for {:.2} s at {} mA",
            self.zeroing.spool_duration_s, BIAS_CURRENT_MA
        );
        for _ in 0..spool_samples {
            if !signals.should_continue() {
                return Err(CalibrationError::Interrupted);
            }
            scheduler.wait();
            transport.read()?;
            transport.command_current(self.identity.motor_sign * BIAS_CURRENT_MA)?;
        }

        info!(
            "zeroing {side}: pulling at {} mA, watching for stillness",
            self.zeroing.pull_current_ma
        );
        let mut stillness = MovingAverage::<ZEROING_WINDOW>::new();
        let mut motor_angle = MovingAverage::<ZEROING_WINDOW>::new();
        let mut ankle_angle = MovingAverage::<ZEROING_WINDOW>::new();

        let mut pulls: u64 = 0;
        loop {
            if !signals.should_continue() {
                return Err(CalibrationError::Interrupted);
            }
            if pulls >= budget_samples {
                warn!(
                    "zeroing {side}: no stillness after {:.1} s, still {:.0}% moving",
                    self.zeroing.timeout_s,
                    stillness.average() * 100.0
                );
                return Err(CalibrationError::Timeout {
                    budget_s: self.zeroing.timeout_s,
                });
            }

            scheduler.wait();
            let frame = transport.read()?;
            transport.command_current(self.identity.motor_sign * self.zeroing.pull_current_ma)?;
            pulls += 1;

            let moving = frame.motor_velocity_deg_s(self.identity.motor_sign).abs()
                > self.zeroing.motor_velocity_threshold
                || frame
                    .ankle_velocity_deg_s(self.identity.ankle_encoder_sign)
                    .abs()
                    > self.zeroing.ankle_velocity_threshold;
            stillness.push(if moving { 1.0 } else { 0.0 });
            motor_angle.push(frame.motor_angle_deg_unreferenced());
            ankle_angle.push(frame.ankle_angle_deg_unreferenced(self.identity.ankle_encoder_sign));

            if stillness.is_saturated() && stillness.average() < self.zeroing.stillness_fraction {
                break;
            }
        }

        let offsets = CalibrationOffsets {
            motor_angle_zero_deg: motor_angle.average(),
            ankle_angle_zero_deg: ankle_angle.average(),
        };
        // Hold the strap taut at bias while the session spins up.
        transport.command_current(self.identity.motor_sign * BIAS_CURRENT_MA)?;

        info!(
            "zeroing {side}: locked after {pulls} pull samples, motor zero {:.3} deg, ankle zero {:.3} deg",
            offsets.motor_angle_zero_deg, offsets.ankle_angle_zero_deg
        );
        let path = offsets.save(&self.out_dir, side)?;
        debug!("zeroing {side}: offsets saved to {}", path.display());
        Ok(offsets)
    }
}
