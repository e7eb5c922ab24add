//! Deterministic scripted backend for benches and tests.
//!
//! `SimulatedExo` implements [`AnkleTransport`] without hardware. Its
//! frames are a pure function of how many reads have been served, so two
//! identically configured instances deliver identical streams regardless
//! of wall-clock timing.
//!
//! The script models a boot being donned: a wiggle phase with moving
//! encoders, then stillness against the hard stop, then (optionally)
//! steady walking. Tests steer a live instance through a [`SimProbe`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::device::{AnkleTransport, CurrentGains, DeviceError};
use crate::frame::RawSensorFrame;

const MOTOR_REST_CLICKS: i32 = 118_000;
const ANKLE_REST_CLICKS: i32 = 2_600;
const CLICKS_PER_DEG: f64 = 16384.0 / 360.0;

/// State a test can observe or inject while the device is owned by a
/// control thread.
#[derive(Debug)]
struct SimShared {
    open: bool,
    streaming: bool,
    stream_rate_hz: Option<u32>,
    gains: Option<CurrentGains>,
    commands: Vec<i32>,
    stop_calls: u32,
    frames_served: u64,
    case_temperature_c: i32,
    /// Additive ankle displacement injected by tests [deg].
    ankle_delta_deg: f64,
    /// Reads in `[start, end)` fail.
    fail_reads: Option<(u64, u64)>,
}

impl SimShared {
    fn new() -> Self {
        Self {
            open: false,
            streaming: false,
            stream_rate_hz: None,
            gains: None,
            commands: Vec::new(),
            stop_calls: 0,
            frames_served: 0,
            case_temperature_c: 35,
            ankle_delta_deg: 0.0,
            fail_reads: None,
        }
    }
}

/// Cloneable handle into a live [`SimulatedExo`].
#[derive(Debug, Clone)]
pub struct SimProbe {
    shared: Arc<Mutex<SimShared>>,
}

impl SimProbe {
    /// Every current command issued so far, oldest first.
    pub fn commands(&self) -> Vec<i32> {
        self.shared.lock().commands.clone()
    }

    pub fn last_command(&self) -> Option<i32> {
        self.shared.lock().commands.last().copied()
    }

    pub fn command_count(&self) -> usize {
        self.shared.lock().commands.len()
    }

    pub fn stop_calls(&self) -> u32 {
        self.shared.lock().stop_calls
    }

    pub fn is_open(&self) -> bool {
        self.shared.lock().open
    }

    pub fn is_streaming(&self) -> bool {
        self.shared.lock().streaming
    }

    pub fn stream_rate_hz(&self) -> Option<u32> {
        self.shared.lock().stream_rate_hz
    }

    pub fn gains(&self) -> Option<CurrentGains> {
        self.shared.lock().gains
    }

    pub fn frames_served(&self) -> u64 {
        self.shared.lock().frames_served
    }

    /// Set the case temperature the next frames will report [°C].
    pub fn set_case_temperature(&self, celsius: i32) {
        self.shared.lock().case_temperature_c = celsius;
    }

    /// Displace the ankle from its rest pose [deg].
    pub fn set_ankle_delta_deg(&self, delta_deg: f64) {
        self.shared.lock().ankle_delta_deg = delta_deg;
    }

    /// Make reads numbered `[start, end)` fail.
    pub fn fail_reads_between(&self, start: u64, end: u64) {
        self.shared.lock().fail_reads = Some((start, end));
    }
}

/// Scripted ankle actuator.
pub struct SimulatedExo {
    device_id: u32,
    /// Reads before the encoders settle against the hard stop.
    settle_after: u64,
    /// Device time advanced per read [ms].
    sample_dt_ms: u32,
    /// Walking script after settling, if any: (start sample, stride [s]).
    walking: Option<(u64, f64)>,
    shared: Arc<Mutex<SimShared>>,
}

impl SimulatedExo {
    pub fn new(device_id: u32) -> Self {
        Self {
            device_id,
            settle_after: 400,
            sample_dt_ms: 2,
            walking: None,
            shared: Arc::new(Mutex::new(SimShared::new())),
        }
    }

    /// Number of reads served before the boot goes still.
    pub fn with_settle_after(mut self, samples: u64) -> Self {
        self.settle_after = samples;
        self
    }

    /// A boot that never stops moving; zeroing against it must time out.
    pub fn never_settling(mut self) -> Self {
        self.settle_after = u64::MAX;
        self
    }

    /// Start a steady walking script `after` reads, with the given stride.
    pub fn with_walking(mut self, after: u64, stride_period_s: f64) -> Self {
        self.walking = Some((after, stride_period_s));
        self
    }

    /// Device milliseconds advanced per read.
    pub fn with_sample_dt_ms(mut self, dt_ms: u32) -> Self {
        self.sample_dt_ms = dt_ms;
        self
    }

    /// Handle for observing and steering this instance from a test.
    pub fn probe(&self) -> SimProbe {
        SimProbe {
            shared: Arc::clone(&self.shared),
        }
    }

    fn scripted_frame(&self, sample: u64, shared: &SimShared) -> RawSensorFrame {
        let mut frame = RawSensorFrame {
            state_time_ms: (sample as u32).wrapping_mul(self.sample_dt_ms),
            accel_y: -8192,
            motor_angle: MOTOR_REST_CLICKS,
            ankle_angle: ANKLE_REST_CLICKS,
            motor_current: if shared.stop_calls > 0 {
                0
            } else {
                shared.commands.last().copied().unwrap_or(0)
            },
            motor_voltage: 22_000,
            battery_current: shared.commands.last().copied().unwrap_or(0).abs() / 10,
            battery_voltage: 24_000,
            temperature: shared.case_temperature_c,
            ..RawSensorFrame::default()
        };

        if sample < self.settle_after {
            // Donning wiggle: both encoders visibly moving.
            let swing = ((sample % 20) as i32 - 10) * 30;
            frame.motor_angle += swing;
            frame.ankle_angle += swing / 8;
            frame.motor_velocity = if sample % 2 == 0 { 400 } else { -400 };
            frame.ankle_velocity = if sample % 2 == 0 { 60 } else { -60 };
        } else if let Some((walk_from, stride_s)) = self.walking {
            if sample >= walk_from {
                let t = (sample - walk_from) as f64 * self.sample_dt_ms as f64 / 1000.0;
                let omega = std::f64::consts::TAU / stride_s;
                let swing_deg = 20.0 * (omega * t).sin();
                let swing_vel = 20.0 * omega * (omega * t).cos();
                frame.ankle_angle += (swing_deg * CLICKS_PER_DEG).round() as i32;
                frame.ankle_velocity = (swing_vel * 10.0).round() as i32;
                frame.motor_angle += (swing_deg * 16.0 * CLICKS_PER_DEG).round() as i32;
                frame.motor_velocity = (swing_vel * 16.0).round() as i32;
            }
        }

        if shared.ankle_delta_deg != 0.0 {
            frame.ankle_angle += (shared.ankle_delta_deg * CLICKS_PER_DEG).round() as i32;
        }

        frame
    }
}

impl AnkleTransport for SimulatedExo {
    fn device_id(&self) -> u32 {
        self.device_id
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        shared.open = true;
        info!("simulated exo {} opened", self.device_id);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        shared.open = false;
        shared.streaming = false;
        info!("simulated exo {} closed", self.device_id);
        Ok(())
    }

    fn start_streaming(&mut self, frequency_hz: u32) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(DeviceError::Closed);
        }
        shared.streaming = true;
        shared.stream_rate_hz = Some(frequency_hz);
        debug!(
            "simulated exo {} streaming at {frequency_hz} Hz",
            self.device_id
        );
        Ok(())
    }

    fn set_gains(&mut self, gains: &CurrentGains) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(DeviceError::Closed);
        }
        shared.gains = Some(*gains);
        Ok(())
    }

    fn read(&mut self) -> Result<RawSensorFrame, DeviceError> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(DeviceError::Closed);
        }
        if !shared.streaming {
            return Err(DeviceError::NotStreaming);
        }

        let sample = shared.frames_served;
        shared.frames_served += 1;

        if let Some((start, end)) = shared.fail_reads {
            if sample >= start && sample < end {
                return Err(DeviceError::ReadFailed(format!(
                    "scripted fault at sample {sample}"
                )));
            }
        }

        Ok(self.scripted_frame(sample, &shared))
    }

    fn command_current(&mut self, milliamps: i32) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(DeviceError::Closed);
        }
        shared.commands.push(milliamps);
        Ok(())
    }

    fn stop_motor(&mut self) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(DeviceError::Closed);
        }
        shared.stop_calls += 1;
        Ok(())
    }
}
