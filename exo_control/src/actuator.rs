//! Per-side actuator control thread.
//!
//! One [`ActuatorControlThread`] owns one worn boot end to end: the
//! deadline-guarded device handle, the zeroing procedure, the torque
//! pipeline, the winding thermal model and the lifecycle machine. The
//! thread runs calibration once, then cycles at the control rate until
//! the lifecycle reaches `Stopped`.
//!
//! Session-wide state crosses in exactly three places, each internally
//! synchronized: the [`SessionHandle`] (mode signals, torque ceilings,
//! thermal reset requests), the gait-estimate slot, and the telemetry
//! sink. Everything else is thread-local by construction.
//!
//! Failure policy: a device I/O failure stops this actuator and leaves
//! the rest of the session running. A hard thermal latch zeroes the
//! command in the same cycle and requests shutdown of the whole
//! session.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use exo_common::config::SessionConfig;
use exo_common::consts::{
    BIAS_CURRENT_MA, DRIVETRAIN_EFFICIENCY, LOOP_FREQ_WINDOW, MAX_ALLOWABLE_CURRENT_MA,
    TORQUE_CONSTANT_NM_PER_MA,
};
use exo_common::estimate::{EstimateSlot, GaitEstimate, SessionClock};
use exo_common::fault::{CycleFault, FaultCounters};
use exo_common::filter::MovingAverage;
use exo_common::offsets::CalibrationOffsets;
use exo_common::record::CycleRecord;
use exo_common::state::{LifecycleCell, LifecycleState, SessionMode, Side};
use exo_hal::deadline::{DeadlinePolicy, GuardedTransport};
use exo_hal::device::{AnkleTransport, CurrentGains, DeviceError};
use exo_hal::frame::{RawSensorFrame, SensorFrame};
use exo_hal::identity::{DeviceIdentity, IdentityRegistry};

use crate::assistance::AssistanceProfile;
use crate::calibration::CalibrationSupervisor;
use crate::error::ControlError;
use crate::lifecycle::{LifecycleEvent, LifecycleMachine, TransitionResult};
use crate::scheduler::{CycleStats, SoftRtScheduler};
use crate::telemetry::SessionHandle;
use crate::thermal::ThermalSafetyModel;
use crate::transmission::TransmissionRatioModel;

// ─── Torque → Current Conversion ────────────────────────────────────

/// Motor current for the desired ankle torque at the given ratio [mA].
///
/// Truncates toward zero; the drive accepts integer milliamps.
pub fn raw_current_ma(torque_nm: f64, ratio: f64) -> i32 {
    (torque_nm / (ratio * DRIVETRAIN_EFFICIENCY * TORQUE_CONSTANT_NM_PER_MA)).trunc() as i32
}

/// Clamp a raw command into the allowed band [mA].
///
/// Returns the vetted value and whether clamping changed it.
pub fn clamp_current_ma(raw_ma: i32) -> (i32, bool) {
    let vetted = raw_ma.clamp(BIAS_CURRENT_MA, MAX_ALLOWABLE_CURRENT_MA);
    (vetted, vetted != raw_ma)
}

// ─── Control Thread ─────────────────────────────────────────────────

/// One side's control thread: device, calibration, torque pipeline,
/// thermal guard and lifecycle, owned together.
pub struct ActuatorControlThread {
    identity: DeviceIdentity,
    transport: GuardedTransport,
    gains: CurrentGains,
    stream_rate_hz: u32,
    max_retries: u32,
    supervisor: CalibrationSupervisor,
    ratio_model: TransmissionRatioModel,
    profile: AssistanceProfile,
    thermal: ThermalSafetyModel,
    machine: LifecycleMachine,
    scheduler: SoftRtScheduler,
    nominal_period_s: f64,
    clock: SessionClock,
    estimates: Arc<EstimateSlot>,
    handle: Arc<SessionHandle>,
    lifecycle: Arc<LifecycleCell>,
    offsets: CalibrationOffsets,
    /// Measured gap between cycle starts; feeds the thermal integrator
    /// and the logged loop frequency.
    loop_gap_s: MovingAverage<LOOP_FREQ_WINDOW>,
    prev_cycle_start: Option<Instant>,
    counters: FaultCounters,
    /// Wire magnitude of the last issued command, before the motor
    /// sign. This is the current heating the winding right now.
    last_sent_ma: i32,
}

impl ActuatorControlThread {
    /// Bind a transport to its configured identity and assemble the
    /// thread state. Refuses device ids absent from the registry.
    pub fn new(
        config: &SessionConfig,
        transport: Box<dyn AnkleTransport>,
        clock: SessionClock,
        estimates: Arc<EstimateSlot>,
        handle: Arc<SessionHandle>,
        lifecycle: Arc<LifecycleCell>,
        calibration_dir: &Path,
    ) -> Result<Self, ControlError> {
        let device_id = transport.device_id();
        let registry = IdentityRegistry::from_config(&config.devices)?;
        let identity = *registry
            .lookup(device_id)
            .ok_or(ControlError::UnknownDevice { device_id })?;

        let supervisor =
            CalibrationSupervisor::new(&config.zeroing, &config.rates, identity, calibration_dir);

        info!(
            side = %identity.side,
            device_id,
            control_rate_hz = config.rates.control_rate_hz,
            "actuator thread bound"
        );

        Ok(Self {
            identity,
            transport: GuardedTransport::new(transport, DeadlinePolicy::from_config(&config.io)),
            gains: CurrentGains::from(&config.gains),
            stream_rate_hz: config.rates.stream_rate_hz,
            max_retries: config.io.max_retries,
            supervisor,
            ratio_model: TransmissionRatioModel::from_config(&config.transmission)?,
            profile: AssistanceProfile::from_config(&config.profile),
            thermal: ThermalSafetyModel::new(config.thermal),
            machine: LifecycleMachine::new(),
            scheduler: SoftRtScheduler::from_rate_hz(config.rates.control_rate_hz),
            nominal_period_s: config.rates.period_s(),
            clock,
            estimates,
            handle,
            lifecycle,
            offsets: CalibrationOffsets::default(),
            loop_gap_s: MovingAverage::new(),
            prev_cycle_start: None,
            counters: FaultCounters::default(),
            last_sent_ma: 0,
        })
    }

    pub fn side(&self) -> Side {
        self.identity.side
    }

    /// Totals of the per-cycle fault flags absorbed so far.
    pub fn counters(&self) -> &FaultCounters {
        &self.counters
    }

    /// Bring the device up, zero the joint, then cycle until the
    /// lifecycle reaches `Stopped`.
    ///
    /// A failure mid-session still drains through the controlled stop
    /// before the first error is returned; the device is released on
    /// every exit path.
    pub fn run(&mut self) -> Result<CycleStats, ControlError> {
        self.lifecycle.store(LifecycleState::Calibrating);

        if let Err(err) = self.bring_up() {
            self.abandon_device();
            self.lifecycle.store(LifecycleState::Stopped);
            return Err(ControlError::Device(err));
        }

        self.offsets = match self
            .supervisor
            .run(&mut self.transport, self.handle.signals())
        {
            Ok(offsets) => offsets,
            Err(err) => {
                self.abandon_device();
                self.lifecycle.store(LifecycleState::Stopped);
                return Err(ControlError::Calibration(err));
            }
        };
        // The supervisor left the joint holding bias; that is the
        // current heating the winding until the first session command.
        self.last_sent_ma = BIAS_CURRENT_MA;
        self.apply_event(LifecycleEvent::ZeroingComplete);

        info!(
            side = %self.identity.side,
            device_id = self.transport.device_id(),
            "zeroed; holding at bias until the session resumes"
        );

        let mut fatal: Option<ControlError> = None;
        while self.machine.state() != LifecycleState::Stopped {
            if let Err(err) = self.cycle() {
                // Keep draining; the first failure is the one reported.
                if fatal.is_none() {
                    fatal = Some(err);
                }
            }
        }

        let stats = self.scheduler.stats().clone();
        info!(
            side = %self.identity.side,
            cycles = stats.cycle_count,
            overruns = stats.overruns,
            avg_cycle_us = stats.avg_cycle_ns() / 1_000,
            clamped_cycles = self.counters.commands_clamped,
            io_retry_cycles = self.counters.io_retries,
            "actuator loop drained"
        );

        match fatal {
            Some(err) => Err(err),
            None => Ok(stats),
        }
    }

    /// One control cycle: pace, sense, decide, act, record.
    fn cycle(&mut self) -> Result<(), ControlError> {
        let mut faults = CycleFault::empty();
        if self.scheduler.wait().is_overrun() {
            faults |= CycleFault::SCHEDULER_OVERRUN;
        }

        let cycle_start = Instant::now();
        if let Some(prev) = self.prev_cycle_start.replace(cycle_start) {
            self.loop_gap_s.push((cycle_start - prev).as_secs_f64());
        }

        // Session signals fold in exactly once per cycle.
        let snapshot = self.handle.signals().snapshot();
        let just_paused = self.apply_session_mode(snapshot.mode);

        if self.machine.state() == LifecycleState::Stopping {
            self.controlled_stop();
            self.apply_event(LifecycleEvent::StopComplete);
            return Ok(());
        }

        if self.handle.take_thermal_reset(self.identity.side) {
            self.thermal.reset();
        }

        let raw = match self.read_with_retries(&mut faults) {
            Ok(raw) => raw,
            Err(err) => {
                faults |= CycleFault::DEVICE_IO_FAILED;
                self.counters.absorb(faults);
                self.push_fault_record(faults, snapshot.log_enabled);
                error!(
                    side = %self.identity.side,
                    device_id = self.transport.device_id(),
                    "sensor read failed after retries: {err}"
                );
                self.apply_event(LifecycleEvent::CriticalFault);
                return Err(ControlError::Device(err));
            }
        };
        let frame = SensorFrame::from_raw(&raw, &self.identity, &self.offsets);

        // Integrate with the current that actually flowed since the
        // last cycle, over the measured (not nominal) period.
        faults |= self.thermal.update(
            frame.case_temperature_c,
            self.last_sent_ma,
            self.measured_period_s(),
        );

        let estimate = self.estimates.snapshot();
        let now_s = self.clock.now_s();
        let phase_time_s = estimate.elapsed_since_heel_strike(now_s);

        // The ratio is a measurement; it is sampled every cycle even
        // when no torque is commanded.
        let ratio = self.ratio_model.lookup(frame.ankle_angle_deg);

        let mut torque_command_nm = 0.0;
        let wire_ma = match self.machine.state() {
            LifecycleState::Active => {
                if ratio.clamped {
                    faults |= CycleFault::RATIO_OUT_OF_RANGE;
                }
                let peak_nm = estimate
                    .peak_torque_nm
                    .min(self.handle.peak_ceiling_nm(self.identity.side));
                torque_command_nm = self.profile.torque_nm(
                    phase_time_s,
                    estimate.stride_period_s,
                    peak_nm,
                    estimate.in_swing,
                );
                let (vetted, clamped) =
                    clamp_current_ma(raw_current_ma(torque_command_nm, ratio.ratio));
                if clamped {
                    faults |= CycleFault::COMMAND_CLAMPED;
                }
                Some(if self.thermal.is_latched() { 0 } else { vetted })
            }
            // Pause entry parks the joint at bias once; Paused cycles
            // after the edge are sense-only.
            LifecycleState::Paused if just_paused => {
                Some(if self.thermal.is_latched() { 0 } else { BIAS_CURRENT_MA })
            }
            // A latch landing mid-pause drops the bias hold.
            LifecycleState::Paused if self.thermal.is_latched() && self.last_sent_ma != 0 => {
                Some(0)
            }
            _ => None,
        };

        if let Some(ma) = wire_ma {
            match self.send_with_retries(self.identity.motor_sign * ma, &mut faults) {
                Ok(()) => self.last_sent_ma = ma,
                Err(err) => {
                    faults |= CycleFault::DEVICE_IO_FAILED;
                    self.counters.absorb(faults);
                    let record = self.build_record(
                        now_s,
                        &frame,
                        &estimate,
                        ratio.ratio,
                        torque_command_nm,
                        faults,
                    );
                    self.handle
                        .sink()
                        .push(self.identity.side, record, snapshot.log_enabled);
                    error!(
                        side = %self.identity.side,
                        device_id = self.transport.device_id(),
                        "command write failed after retries: {err}"
                    );
                    self.apply_event(LifecycleEvent::CriticalFault);
                    return Err(ControlError::Device(err));
                }
            }
        }

        self.counters.absorb(faults);
        let record = self.build_record(
            now_s,
            &frame,
            &estimate,
            ratio.ratio,
            torque_command_nm,
            faults,
        );
        self.handle
            .sink()
            .push(self.identity.side, record, snapshot.log_enabled);

        // A hard thermal latch takes the whole session down, not just
        // this side.
        if faults.intersects(CycleFault::THERMAL_HARD_MASK) {
            self.handle.signals().request_shutdown();
            self.apply_event(LifecycleEvent::CriticalFault);
        }

        Ok(())
    }

    /// Fold the session-wide mode into this thread's lifecycle.
    ///
    /// Returns true on the pause entry edge, the one cycle that issues
    /// the bias hold.
    fn apply_session_mode(&mut self, mode: SessionMode) -> bool {
        match (mode, self.machine.state()) {
            (SessionMode::Shutdown, LifecycleState::Calibrating)
            | (SessionMode::Shutdown, LifecycleState::Paused)
            | (SessionMode::Shutdown, LifecycleState::Active) => {
                self.apply_event(LifecycleEvent::ShutdownRequested);
                false
            }
            (SessionMode::Running, LifecycleState::Paused) => {
                self.apply_event(LifecycleEvent::Resume);
                false
            }
            (SessionMode::Standby, LifecycleState::Active) => {
                self.apply_event(LifecycleEvent::Pause);
                true
            }
            _ => false,
        }
    }

    fn apply_event(&mut self, event: LifecycleEvent) {
        match self.machine.handle_event(event) {
            TransitionResult::Ok(state) => {
                self.lifecycle.store(state);
                debug!(side = %self.identity.side, ?event, ?state, "lifecycle transition");
            }
            TransitionResult::Rejected(reason) => {
                warn!(side = %self.identity.side, ?event, "lifecycle event rejected: {reason}");
            }
        }
    }

    fn read_with_retries(&mut self, faults: &mut CycleFault) -> Result<RawSensorFrame, DeviceError> {
        let mut attempt = 0;
        loop {
            match self.transport.read() {
                Ok(raw) => return Ok(raw),
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    *faults |= CycleFault::DEVICE_IO_RETRY;
                    warn!(
                        device_id = self.transport.device_id(),
                        attempt, "sensor read retry: {err}"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn send_with_retries(
        &mut self,
        wire_ma: i32,
        faults: &mut CycleFault,
    ) -> Result<(), DeviceError> {
        let mut attempt = 0;
        loop {
            match self.transport.command_current(wire_ma) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    *faults |= CycleFault::DEVICE_IO_RETRY;
                    warn!(
                        device_id = self.transport.device_id(),
                        attempt, "command retry: {err}"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Measured loop period, falling back to nominal until the tracking
    /// window has its first sample.
    fn measured_period_s(&self) -> f64 {
        if self.loop_gap_s.is_empty() {
            self.nominal_period_s
        } else {
            self.loop_gap_s.average()
        }
    }

    fn measured_loop_freq_hz(&self) -> f64 {
        let period = self.measured_period_s();
        if period > 0.0 { 1.0 / period } else { 0.0 }
    }

    fn build_record(
        &self,
        now_s: f64,
        frame: &SensorFrame,
        estimate: &GaitEstimate,
        ratio: f64,
        torque_command_nm: f64,
        faults: CycleFault,
    ) -> CycleRecord {
        let peak_nm = estimate
            .peak_torque_nm
            .min(self.handle.peak_ceiling_nm(self.identity.side));
        // Ankle-frame torque from the measured motor current.
        let delivered_torque_nm = self.identity.motor_sign as f64
            * frame.motor_current_ma
            * TORQUE_CONSTANT_NM_PER_MA
            * DRIVETRAIN_EFFICIENCY
            * ratio;

        CycleRecord {
            timestamp_s: now_s,
            loop_freq_hz: self.measured_loop_freq_hz(),
            state_time_s: frame.state_time_s,
            heel_strike_s: estimate.heel_strike_s,
            stride_period_s: estimate.stride_period_s,
            phase_time_s: estimate.elapsed_since_heel_strike(now_s),
            peak_torque_nm: peak_nm,
            in_swing: estimate.in_swing,
            transmission_ratio: ratio,
            torque_command_nm,
            current_command_ma: self.last_sent_ma,
            delivered_torque_nm,
            ankle_angle_deg: frame.ankle_angle_deg,
            ankle_velocity_deg_s: frame.ankle_velocity_deg_s,
            motor_angle_deg: frame.motor_angle_deg,
            motor_velocity_deg_s: frame.motor_velocity_deg_s,
            motor_current_ma: frame.motor_current_ma,
            motor_voltage_mv: frame.motor_voltage_mv,
            battery_current_ma: frame.battery_current_ma,
            battery_voltage_mv: frame.battery_voltage_mv,
            case_temp_c: frame.case_temperature_c,
            winding_temp_c: self.thermal.winding_temp_c(),
            accel_x_g: frame.accel_x_g,
            accel_y_g: frame.accel_y_g,
            accel_z_g: frame.accel_z_g,
            gyro_x_deg_s: frame.gyro_x_deg_s,
            gyro_y_deg_s: frame.gyro_y_deg_s,
            gyro_z_deg_s: frame.gyro_z_deg_s,
            faults,
        }
    }

    /// Sparse record for cycles that never produced a sensor frame.
    fn push_fault_record(&self, faults: CycleFault, enqueue: bool) {
        let record = CycleRecord {
            timestamp_s: self.clock.now_s(),
            loop_freq_hz: self.measured_loop_freq_hz(),
            case_temp_c: self.thermal.case_temp_c(),
            winding_temp_c: self.thermal.winding_temp_c(),
            faults,
            ..CycleRecord::default()
        };
        self.handle.sink().push(self.identity.side, record, enqueue);
    }

    /// Drain sequence: settle the joint, cut current, release the
    /// device. Every step is best-effort; a latched winding skips the
    /// bias settle and goes straight to zero.
    fn controlled_stop(&mut self) {
        info!(side = %self.identity.side, "controlled stop");
        let settle_ma = if self.thermal.is_latched() {
            0
        } else {
            BIAS_CURRENT_MA
        };
        if let Err(err) = self
            .transport
            .command_current(self.identity.motor_sign * settle_ma)
        {
            warn!("settle command during stop failed: {err}");
        }
        if let Err(err) = self.transport.command_current(0) {
            warn!("zero command during stop failed: {err}");
        }
        if let Err(err) = self.transport.stop_motor() {
            warn!("motor stop failed: {err}");
        }
        if let Err(err) = self.transport.close() {
            warn!("device close failed: {err}");
        }
        self.last_sent_ma = 0;
    }

    fn bring_up(&mut self) -> Result<(), DeviceError> {
        self.transport.open()?;
        self.transport.set_gains(&self.gains)?;
        self.transport.start_streaming(self.stream_rate_hz)?;
        info!(
            side = %self.identity.side,
            device_id = self.transport.device_id(),
            stream_rate_hz = self.stream_rate_hz,
            "device online"
        );
        Ok(())
    }

    /// Best-effort release for paths that never reach the drain loop.
    fn abandon_device(&mut self) {
        if let Err(err) = self.transport.stop_motor() {
            debug!("stop on abandoned device failed: {err}");
        }
        if let Err(err) = self.transport.close() {
            debug!("close on abandoned device failed: {err}");
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
