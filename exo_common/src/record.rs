//! Fixed-layout per-cycle telemetry record.
//!
//! One `CycleRecord` is produced per control cycle. The layout is a
//! compile-time schema: [`FIELD_NAMES`] names every column in order, and
//! remote clients read single fields by name without any per-cycle
//! allocation on the producing thread.

use static_assertions::const_assert_eq;

use crate::fault::CycleFault;

/// Number of columns in a cycle record.
pub const FIELD_COUNT: usize = 29;

/// Column names, in the exact order [`CycleRecord::values`] emits them.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "timestamp_s",
    "loop_freq_hz",
    "state_time_s",
    "heel_strike_s",
    "stride_period_s",
    "phase_time_s",
    "peak_torque_nm",
    "in_swing",
    "transmission_ratio",
    "torque_command_nm",
    "current_command_ma",
    "delivered_torque_nm",
    "ankle_angle_deg",
    "ankle_velocity_deg_s",
    "motor_angle_deg",
    "motor_velocity_deg_s",
    "motor_current_ma",
    "motor_voltage_mv",
    "battery_current_ma",
    "battery_voltage_mv",
    "case_temp_c",
    "winding_temp_c",
    "accel_x_g",
    "accel_y_g",
    "accel_z_g",
    "gyro_x_deg_s",
    "gyro_y_deg_s",
    "gyro_z_deg_s",
    "fault_bits",
];

const_assert_eq!(FIELD_NAMES.len(), FIELD_COUNT);

/// Everything the session knows about one control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleRecord {
    /// Session-relative time the record was filled [s].
    pub timestamp_s: f64,
    /// Measured loop frequency over the tracking window [Hz].
    pub loop_freq_hz: f64,
    /// Device-side timestamp of the sensor frame [s].
    pub state_time_s: f64,

    // Gait estimate, as used by this cycle
    /// Heel strike the cycle worked against [s].
    pub heel_strike_s: f64,
    /// Stride period the cycle worked against [s].
    pub stride_period_s: f64,
    /// Elapsed time into the stride [s].
    pub phase_time_s: f64,
    /// Effective peak torque after the session ceiling [Nm].
    pub peak_torque_nm: f64,
    /// Swing flag from the estimate.
    pub in_swing: bool,

    // Torque pipeline
    /// Transmission ratio sampled for this cycle's ankle angle.
    pub transmission_ratio: f64,
    /// Ankle torque requested from the profile [Nm].
    pub torque_command_nm: f64,
    /// Vetted current handed to the device, before the motor sign [mA].
    pub current_command_ma: i32,
    /// Torque estimate from the measured motor current [Nm].
    pub delivered_torque_nm: f64,

    // Scaled sensor view
    pub ankle_angle_deg: f64,
    pub ankle_velocity_deg_s: f64,
    pub motor_angle_deg: f64,
    pub motor_velocity_deg_s: f64,
    pub motor_current_ma: f64,
    pub motor_voltage_mv: f64,
    pub battery_current_ma: f64,
    pub battery_voltage_mv: f64,
    pub case_temp_c: f64,
    /// Winding temperature estimate from the thermal model [°C].
    pub winding_temp_c: f64,
    pub accel_x_g: f64,
    pub accel_y_g: f64,
    pub accel_z_g: f64,
    pub gyro_x_deg_s: f64,
    pub gyro_y_deg_s: f64,
    pub gyro_z_deg_s: f64,

    /// Fault flags raised during the cycle.
    pub faults: CycleFault,
}

impl CycleRecord {
    /// All columns as `f64`, in [`FIELD_NAMES`] order.
    pub fn values(&self) -> [f64; FIELD_COUNT] {
        [
            self.timestamp_s,
            self.loop_freq_hz,
            self.state_time_s,
            self.heel_strike_s,
            self.stride_period_s,
            self.phase_time_s,
            self.peak_torque_nm,
            if self.in_swing { 1.0 } else { 0.0 },
            self.transmission_ratio,
            self.torque_command_nm,
            self.current_command_ma as f64,
            self.delivered_torque_nm,
            self.ankle_angle_deg,
            self.ankle_velocity_deg_s,
            self.motor_angle_deg,
            self.motor_velocity_deg_s,
            self.motor_current_ma,
            self.motor_voltage_mv,
            self.battery_current_ma,
            self.battery_voltage_mv,
            self.case_temp_c,
            self.winding_temp_c,
            self.accel_x_g,
            self.accel_y_g,
            self.accel_z_g,
            self.gyro_x_deg_s,
            self.gyro_y_deg_s,
            self.gyro_z_deg_s,
            self.faults.bits() as f64,
        ]
    }

    /// Read one column by name. Returns `None` for unknown names.
    pub fn field(&self, name: &str) -> Option<f64> {
        let index = FIELD_NAMES.iter().position(|candidate| *candidate == name)?;
        Some(self.values()[index])
    }

    /// Comma-separated header line matching [`CycleRecord::csv_row`].
    pub fn csv_header() -> String {
        FIELD_NAMES.join(",")
    }

    /// Comma-separated row of this record's values.
    pub fn csv_row(&self) -> String {
        let values = self.values();
        let mut row = String::with_capacity(FIELD_COUNT * 12);
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                row.push(',');
            }
            row.push_str(&format!("{value}"));
        }
        row
    }
}
