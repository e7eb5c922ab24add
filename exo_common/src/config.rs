//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across the exo workspace, plus the session configuration consumed by the
//! control binary. Every section has complete defaults so a session can run
//! without a config file at all.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "exo-session-01"
//!
//! [rates]
//! control_rate_hz = 500.0
//!
//! [[devices]]
//! ids = [77, 17584]
//! side = "right"
//! motor_sign = -1
//! ankle_encoder_sign = -1
//!
//! [thermal]
//! winding_hard_c = 115.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts;
use crate::state::Side;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Common configuration fields shared across exo applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "exo-session".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Loop & Streaming Rates ─────────────────────────────────────────

/// Control loop and device streaming rates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Control loop rate [Hz].
    #[serde(default = "default_control_rate_hz")]
    pub control_rate_hz: f64,

    /// Device-side sensor streaming rate [Hz].
    #[serde(default = "default_stream_rate_hz")]
    pub stream_rate_hz: u32,
}

fn default_control_rate_hz() -> f64 {
    consts::CONTROL_RATE_HZ
}
fn default_stream_rate_hz() -> u32 {
    consts::STREAMING_RATE_HZ
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            control_rate_hz: consts::CONTROL_RATE_HZ,
            stream_rate_hz: consts::STREAMING_RATE_HZ,
        }
    }
}

impl RatesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.control_rate_hz.is_finite()
            || self.control_rate_hz <= 0.0
            || self.control_rate_hz > 100_000.0
        {
            return Err(ConfigError::ValidationError(format!(
                "control_rate_hz must be in (0, 100000], got {}",
                self.control_rate_hz
            )));
        }
        if self.stream_rate_hz == 0 {
            return Err(ConfigError::ValidationError(
                "stream_rate_hz must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Control loop period [s].
    #[inline]
    pub fn period_s(&self) -> f64 {
        1.0 / self.control_rate_hz
    }
}

// ─── Device Current-Loop Gains ──────────────────────────────────────

/// Gains pushed to the on-device current controller at bring-up.
///
/// `k1`/`k2` are only meaningful for position modes and stay zero for
/// current control.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GainsConfig {
    #[serde(default = "default_kp")]
    pub kp: u16,
    #[serde(default = "default_ki")]
    pub ki: u16,
    #[serde(default)]
    pub kd: u16,
    #[serde(default)]
    pub k1: u16,
    #[serde(default)]
    pub k2: u16,
    #[serde(default = "default_ff")]
    pub ff: u16,
}

fn default_kp() -> u16 {
    consts::DEFAULT_KP
}
fn default_ki() -> u16 {
    consts::DEFAULT_KI
}
fn default_ff() -> u16 {
    consts::DEFAULT_FF
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            kp: consts::DEFAULT_KP,
            ki: consts::DEFAULT_KI,
            kd: consts::DEFAULT_KD,
            k1: 0,
            k2: 0,
            ff: consts::DEFAULT_FF,
        }
    }
}

// ─── Device Identity Table ──────────────────────────────────────────

/// One row of the device identity table.
///
/// Each physical boot reports one of the listed ids over the transport;
/// the row tells the session which side it is worn on and which sign
/// conventions its motor and ankle encoder use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceIdentityConfig {
    /// Transport ids this row covers.
    pub ids: Vec<u32>,
    /// Side the device is worn on.
    pub side: Side,
    /// Motor rotation sign mapping device frame to plantarflexion (+1 or -1).
    pub motor_sign: i32,
    /// Ankle encoder sign mapping device frame to dorsiflexion (+1 or -1).
    pub ankle_encoder_sign: i32,
}

fn default_devices() -> Vec<DeviceIdentityConfig> {
    vec![
        DeviceIdentityConfig {
            ids: vec![77, 17584],
            side: Side::Right,
            motor_sign: -1,
            ankle_encoder_sign: -1,
        },
        DeviceIdentityConfig {
            ids: vec![888, 48390],
            side: Side::Left,
            motor_sign: -1,
            ankle_encoder_sign: 1,
        },
    ]
}

fn validate_devices(devices: &[DeviceIdentityConfig]) -> Result<(), ConfigError> {
    let mut seen = Vec::new();
    for row in devices {
        if row.ids.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "device row for side '{}' has no ids",
                row.side
            )));
        }
        if row.motor_sign.abs() != 1 || row.ankle_encoder_sign.abs() != 1 {
            return Err(ConfigError::ValidationError(format!(
                "device signs for side '{}' must be +1 or -1",
                row.side
            )));
        }
        for id in &row.ids {
            if seen.contains(id) {
                return Err(ConfigError::ValidationError(format!(
                    "device id {id} appears more than once"
                )));
            }
            seen.push(*id);
        }
    }
    Ok(())
}

// ─── Encoder Zeroing ────────────────────────────────────────────────

/// Parameters of the belt-spool and encoder-zeroing procedure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZeroingConfig {
    /// Current held while pulling the ankle against its hard stop [mA].
    #[serde(default = "default_pull_current_ma")]
    pub pull_current_ma: i32,

    /// Belt spool duration before the pull starts [s].
    #[serde(default = "default_spool_duration_s")]
    pub spool_duration_s: f64,

    /// Motor velocity magnitude below which the motor counts as still [deg/s].
    #[serde(default = "default_motor_velocity_threshold")]
    pub motor_velocity_threshold: f64,

    /// Ankle velocity magnitude below which the joint counts as still [deg/s].
    #[serde(default = "default_ankle_velocity_threshold")]
    pub ankle_velocity_threshold: f64,

    /// Fraction of the stillness window allowed to be moving at lock time.
    #[serde(default = "default_stillness_fraction")]
    pub stillness_fraction: f64,

    /// Give up if stillness is not reached within this many seconds [s].
    #[serde(default = "default_zeroing_timeout_s")]
    pub timeout_s: f64,
}

fn default_pull_current_ma() -> i32 {
    1000
}
fn default_spool_duration_s() -> f64 {
    0.5
}
fn default_motor_velocity_threshold() -> f64 {
    100.0
}
fn default_ankle_velocity_threshold() -> f64 {
    1.0
}
fn default_stillness_fraction() -> f64 {
    0.05
}
fn default_zeroing_timeout_s() -> f64 {
    30.0
}

impl Default for ZeroingConfig {
    fn default() -> Self {
        Self {
            pull_current_ma: default_pull_current_ma(),
            spool_duration_s: default_spool_duration_s(),
            motor_velocity_threshold: default_motor_velocity_threshold(),
            ankle_velocity_threshold: default_ankle_velocity_threshold(),
            stillness_fraction: default_stillness_fraction(),
            timeout_s: default_zeroing_timeout_s(),
        }
    }
}

impl ZeroingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pull_current_ma <= 0 || self.pull_current_ma > consts::MAX_ALLOWABLE_CURRENT_MA {
            return Err(ConfigError::ValidationError(format!(
                "pull_current_ma must be in (0, {}], got {}",
                consts::MAX_ALLOWABLE_CURRENT_MA,
                self.pull_current_ma
            )));
        }
        if self.spool_duration_s < 0.0 || !self.spool_duration_s.is_finite() {
            return Err(ConfigError::ValidationError(
                "spool_duration_s must be non-negative".to_string(),
            ));
        }
        if self.motor_velocity_threshold <= 0.0 || self.ankle_velocity_threshold <= 0.0 {
            return Err(ConfigError::ValidationError(
                "velocity thresholds must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.stillness_fraction) || self.stillness_fraction == 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "stillness_fraction must be in (0, 1), got {}",
                self.stillness_fraction
            )));
        }
        if self.timeout_s <= 0.0 || !self.timeout_s.is_finite() {
            return Err(ConfigError::ValidationError(
                "timeout_s must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Thermal Safety ─────────────────────────────────────────────────

/// Thermal limits and the lumped winding model parameters.
///
/// The winding temperature is not measured; it is integrated from the
/// commanded current and the measured case temperature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermalConfig {
    /// Case temperature warning threshold [°C].
    #[serde(default = "default_case_soft_c")]
    pub case_soft_c: f64,
    /// Case temperature shutdown threshold [°C].
    #[serde(default = "default_case_hard_c")]
    pub case_hard_c: f64,
    /// Winding estimate warning threshold [°C].
    #[serde(default = "default_winding_soft_c")]
    pub winding_soft_c: f64,
    /// Winding estimate shutdown threshold [°C].
    #[serde(default = "default_winding_hard_c")]
    pub winding_hard_c: f64,

    /// Winding resistance at the reference temperature [Ω].
    #[serde(default = "default_winding_resistance_ohm")]
    pub winding_resistance_ohm: f64,
    /// Copper resistance temperature coefficient [1/K].
    #[serde(default = "default_resistance_temp_coeff")]
    pub resistance_temp_coeff_per_k: f64,
    /// Temperature at which the winding resistance was measured [°C].
    #[serde(default = "default_reference_temp_c")]
    pub reference_temp_c: f64,
    /// Winding thermal capacity [J/K].
    #[serde(default = "default_winding_heat_capacity")]
    pub winding_heat_capacity_j_per_k: f64,
    /// Winding-to-case thermal resistance [K/W].
    #[serde(default = "default_winding_to_case_resistance")]
    pub winding_to_case_resistance_k_per_w: f64,
}

fn default_case_soft_c() -> f64 {
    75.0
}
fn default_case_hard_c() -> f64 {
    80.0
}
fn default_winding_soft_c() -> f64 {
    100.0
}
fn default_winding_hard_c() -> f64 {
    115.0
}
fn default_winding_resistance_ohm() -> f64 {
    0.279
}
fn default_resistance_temp_coeff() -> f64 {
    0.00393
}
fn default_reference_temp_c() -> f64 {
    25.0
}
fn default_winding_heat_capacity() -> f64 {
    16.292
}
fn default_winding_to_case_resistance() -> f64 {
    1.0702867
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            case_soft_c: default_case_soft_c(),
            case_hard_c: default_case_hard_c(),
            winding_soft_c: default_winding_soft_c(),
            winding_hard_c: default_winding_hard_c(),
            winding_resistance_ohm: default_winding_resistance_ohm(),
            resistance_temp_coeff_per_k: default_resistance_temp_coeff(),
            reference_temp_c: default_reference_temp_c(),
            winding_heat_capacity_j_per_k: default_winding_heat_capacity(),
            winding_to_case_resistance_k_per_w: default_winding_to_case_resistance(),
        }
    }
}

impl ThermalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.case_soft_c >= self.case_hard_c {
            return Err(ConfigError::ValidationError(format!(
                "case_soft_c ({}) must be below case_hard_c ({})",
                self.case_soft_c, self.case_hard_c
            )));
        }
        if self.winding_soft_c >= self.winding_hard_c {
            return Err(ConfigError::ValidationError(format!(
                "winding_soft_c ({}) must be below winding_hard_c ({})",
                self.winding_soft_c, self.winding_hard_c
            )));
        }
        if self.winding_resistance_ohm <= 0.0
            || self.winding_heat_capacity_j_per_k <= 0.0
            || self.winding_to_case_resistance_k_per_w <= 0.0
        {
            return Err(ConfigError::ValidationError(
                "thermal model parameters must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Transmission Ratio ─────────────────────────────────────────────

/// Transmission ratio model bounds and the default characterization.
///
/// `motor_angle_coeffs` are the cubic fit of motor angle against ankle
/// angle, highest degree first. A characterization file, when present,
/// replaces the inline coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmissionConfig {
    /// Lower edge of the characterized ankle range [deg].
    #[serde(default = "default_min_angle_deg")]
    pub min_angle_deg: f64,
    /// Upper edge of the characterized ankle range [deg].
    #[serde(default = "default_max_angle_deg")]
    pub max_angle_deg: f64,
    /// Number of samples in the precomputed ratio table.
    #[serde(default = "default_tr_granularity")]
    pub granularity: usize,
    /// Smallest ratio the model will ever report.
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f64,
    /// Cubic motor-angle fit, highest degree first.
    #[serde(default = "default_motor_angle_coeffs")]
    pub motor_angle_coeffs: [f64; 4],
    /// Ankle angle offset recorded at characterization time [deg].
    #[serde(default)]
    pub angle_offset_deg: f64,
    /// Optional characterization file overriding the inline coefficients.
    #[serde(default)]
    pub characterization_path: Option<PathBuf>,
}

fn default_min_angle_deg() -> f64 {
    0.0
}
fn default_max_angle_deg() -> f64 {
    105.0
}
fn default_tr_granularity() -> usize {
    10_000
}
fn default_min_ratio() -> f64 {
    10.0
}
fn default_motor_angle_coeffs() -> [f64; 4] {
    // Bench fit of the belt drivetrain: ratio 18 at the neutral ankle,
    // easing toward the floor at deep plantarflexion.
    [3.3333e-5, -0.045, 18.0, 0.0]
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            min_angle_deg: default_min_angle_deg(),
            max_angle_deg: default_max_angle_deg(),
            granularity: default_tr_granularity(),
            min_ratio: default_min_ratio(),
            motor_angle_coeffs: default_motor_angle_coeffs(),
            angle_offset_deg: 0.0,
            characterization_path: None,
        }
    }
}

impl TransmissionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_angle_deg.is_finite() || !self.max_angle_deg.is_finite() {
            return Err(ConfigError::ValidationError(
                "transmission angle bounds must be finite".to_string(),
            ));
        }
        if self.min_angle_deg >= self.max_angle_deg {
            return Err(ConfigError::ValidationError(format!(
                "min_angle_deg ({}) must be below max_angle_deg ({})",
                self.min_angle_deg, self.max_angle_deg
            )));
        }
        if self.granularity < 2 {
            return Err(ConfigError::ValidationError(format!(
                "granularity must be at least 2, got {}",
                self.granularity
            )));
        }
        if self.min_ratio <= 0.0 || !self.min_ratio.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "min_ratio must be positive, got {}",
                self.min_ratio
            )));
        }
        Ok(())
    }
}

// ─── Assistance Profile ─────────────────────────────────────────────

/// Shape of the stance-phase assistance spline, in percent of stride.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Rise duration before the peak [% stride].
    #[serde(default = "default_rise_pct")]
    pub rise_pct: f64,
    /// Stride percent at which torque peaks.
    #[serde(default = "default_peak_pct")]
    pub peak_pct: f64,
    /// Fall duration after the peak [% stride].
    #[serde(default = "default_fall_pct")]
    pub fall_pct: f64,
    /// Stride percent at which the foot leaves the ground.
    #[serde(default = "default_toe_off_pct")]
    pub toe_off_pct: f64,
    /// Torque held outside the assistance window [Nm].
    #[serde(default = "default_holding_torque_nm")]
    pub holding_torque_nm: f64,
    /// Number of samples in the precomputed profile table.
    #[serde(default = "default_profile_granularity")]
    pub granularity: usize,
    /// Session-wide ceiling on the commanded peak torque [Nm].
    #[serde(default = "default_peak_torque_limit_nm")]
    pub peak_torque_limit_nm: f64,
}

fn default_rise_pct() -> f64 {
    15.0
}
fn default_peak_pct() -> f64 {
    54.0
}
fn default_fall_pct() -> f64 {
    12.0
}
fn default_toe_off_pct() -> f64 {
    67.0
}
fn default_holding_torque_nm() -> f64 {
    consts::HOLDING_TORQUE_NM
}
fn default_profile_granularity() -> usize {
    10_000
}
fn default_peak_torque_limit_nm() -> f64 {
    25.0
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            rise_pct: default_rise_pct(),
            peak_pct: default_peak_pct(),
            fall_pct: default_fall_pct(),
            toe_off_pct: default_toe_off_pct(),
            holding_torque_nm: consts::HOLDING_TORQUE_NM,
            granularity: default_profile_granularity(),
            peak_torque_limit_nm: default_peak_torque_limit_nm(),
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rise_pct <= 0.0 || self.fall_pct <= 0.0 {
            return Err(ConfigError::ValidationError(
                "rise_pct and fall_pct must be positive".to_string(),
            ));
        }
        if self.peak_pct - self.rise_pct < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "rise_pct ({}) reaches before heel strike (peak_pct {})",
                self.rise_pct, self.peak_pct
            )));
        }
        if self.peak_pct + self.fall_pct > self.toe_off_pct {
            return Err(ConfigError::ValidationError(format!(
                "profile must decay to holding torque by toe-off ({}% + {}% > {}%)",
                self.peak_pct, self.fall_pct, self.toe_off_pct
            )));
        }
        if self.toe_off_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "toe_off_pct must be at most 100, got {}",
                self.toe_off_pct
            )));
        }
        if self.holding_torque_nm < 0.0 || !self.holding_torque_nm.is_finite() {
            return Err(ConfigError::ValidationError(
                "holding_torque_nm must be non-negative".to_string(),
            ));
        }
        if self.granularity < 2 {
            return Err(ConfigError::ValidationError(format!(
                "granularity must be at least 2, got {}",
                self.granularity
            )));
        }
        if self.peak_torque_limit_nm <= 0.0 || !self.peak_torque_limit_nm.is_finite() {
            return Err(ConfigError::ValidationError(
                "peak_torque_limit_nm must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Device I/O Deadlines ───────────────────────────────────────────

/// Deadlines and retry budget for per-cycle device calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IoConfig {
    /// Deadline for one sensor read [µs].
    #[serde(default = "default_read_deadline_us")]
    pub read_deadline_us: u64,
    /// Deadline for one current command [µs].
    #[serde(default = "default_write_deadline_us")]
    pub write_deadline_us: u64,
    /// Retries allowed within a single cycle before the thread stops.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_read_deadline_us() -> u64 {
    500
}
fn default_write_deadline_us() -> u64 {
    500
}
fn default_max_retries() -> u32 {
    3
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            read_deadline_us: default_read_deadline_us(),
            write_deadline_us: default_write_deadline_us(),
            max_retries: default_max_retries(),
        }
    }
}

impl IoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_deadline_us == 0 || self.write_deadline_us == 0 {
            return Err(ConfigError::ValidationError(
                "I/O deadlines must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Session Configuration ──────────────────────────────────────────

/// Complete configuration of one exo session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub gains: GainsConfig,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceIdentityConfig>,
    #[serde(default)]
    pub zeroing: ZeroingConfig,
    #[serde(default)]
    pub thermal: ThermalConfig,
    #[serde(default)]
    pub transmission: TransmissionConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub io: IoConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            rates: RatesConfig::default(),
            gains: GainsConfig::default(),
            devices: default_devices(),
            zeroing: ZeroingConfig::default(),
            thermal: ThermalConfig::default(),
            transmission: TransmissionConfig::default(),
            profile: ProfileConfig::default(),
            io: IoConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.rates.validate()?;
        validate_devices(&self.devices)?;
        self.zeroing.validate()?;
        self.thermal.validate()?;
        self.transmission.validate()?;
        self.profile.validate()?;
        self.io.validate()?;
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Returns `ConfigError::ValidationError` if semantic validation fails
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
