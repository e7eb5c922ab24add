//! System-wide constants for the exo workspace.
//!
//! Single source of truth for all actuator limits, unit conversions and
//! default paths. Imported by all crates — no duplication permitted.

/// Lowest current ever commanded to a motor outside of shutdown [mA].
/// Keeps the transmission belt taut so torque onset is not delayed by slack.
pub const BIAS_CURRENT_MA: i32 = 500;

/// Absolute current ceiling for the motor winding [mA].
pub const MAX_ALLOWABLE_CURRENT_MA: i32 = 27_000;

/// Motor torque constant [Nm/mA].
pub const TORQUE_CONSTANT_NM_PER_MA: f64 = 0.000146;

/// Drivetrain efficiency applied between motor torque and ankle torque.
pub const DRIVETRAIN_EFFICIENCY: f64 = 0.9;

/// Encoder clicks to degrees (14-bit encoder over a full turn).
pub const ENC_CLICKS_TO_DEG: f64 = 360.0 / 16384.0;

/// Accelerometer LSB to g.
pub const ACCEL_LSB_TO_G: f64 = 1.0 / 8192.0;

/// Gyroscope LSB to deg/s.
pub const GYRO_LSB_TO_DEG_S: f64 = 1.0 / 32.75;

/// Default control loop rate [Hz] (period 2 ms).
pub const CONTROL_RATE_HZ: f64 = 500.0;

/// Default device-side sensor streaming rate [Hz].
pub const STREAMING_RATE_HZ: u32 = 1000;

/// Default current-loop gains pushed to the device controller.
pub const DEFAULT_KP: u16 = 40;
/// See [`DEFAULT_KP`].
pub const DEFAULT_KI: u16 = 400;
/// See [`DEFAULT_KP`].
pub const DEFAULT_KD: u16 = 0;
/// Feed-forward term for the device current loop.
pub const DEFAULT_FF: u16 = 128;

/// Samples in the encoder-zeroing stillness window.
/// At the default loop rate this is a 5 s observation window.
pub const ZEROING_WINDOW: usize = 2500;

/// Samples in the measured loop-period window (1 s at the default rate).
pub const LOOP_FREQ_WINDOW: usize = 500;

/// Torque held through swing and whenever no assistance is due [Nm].
pub const HOLDING_TORQUE_NM: f64 = 2.0;

/// Default session configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/session.toml";

/// Default directory for persisted encoder offsets.
pub const DEFAULT_CALIBRATION_DIR: &str = "calibration";
