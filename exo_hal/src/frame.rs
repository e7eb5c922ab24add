//! Raw device frames and their engineering-unit scaling.
//!
//! A [`RawSensorFrame`] is what the wire delivers: integer counts in the
//! device's own sign frame. A [`SensorFrame`] is what the control loops
//! consume: degrees, g, mA and °C in the anatomical frame, with the
//! session's encoder zeros subtracted.

use exo_common::consts::{ACCEL_LSB_TO_G, ENC_CLICKS_TO_DEG, GYRO_LSB_TO_DEG_S};
use exo_common::offsets::CalibrationOffsets;

use crate::identity::DeviceIdentity;

/// One sensor frame exactly as the device reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSensorFrame {
    /// Device-side timestamp [ms].
    pub state_time_ms: u32,
    /// Accelerometer counts.
    pub accel_x: i32,
    pub accel_y: i32,
    pub accel_z: i32,
    /// Gyroscope counts.
    pub gyro_x: i32,
    pub gyro_y: i32,
    pub gyro_z: i32,
    /// Ankle encoder [clicks].
    pub ankle_angle: i32,
    /// Ankle velocity [deg/s × 10].
    pub ankle_velocity: i32,
    /// Motor encoder [clicks].
    pub motor_angle: i32,
    /// Motor velocity [deg/s].
    pub motor_velocity: i32,
    /// Winding current [mA], device sign frame.
    pub motor_current: i32,
    /// Motor supply voltage [mV].
    pub motor_voltage: i32,
    /// Battery current [mA].
    pub battery_current: i32,
    /// Battery voltage [mV].
    pub battery_voltage: i32,
    /// Case temperature [°C].
    pub temperature: i32,
}

impl RawSensorFrame {
    /// Motor angle in degrees, unsigned device frame, no zero applied.
    ///
    /// This is the quantity zeroing averages; the locked offset is later
    /// subtracted in this same frame.
    #[inline]
    pub fn motor_angle_deg_unreferenced(&self) -> f64 {
        self.motor_angle as f64 * ENC_CLICKS_TO_DEG
    }

    /// Ankle angle in degrees in the anatomical frame, no zero applied.
    #[inline]
    pub fn ankle_angle_deg_unreferenced(&self, ankle_encoder_sign: i32) -> f64 {
        ankle_encoder_sign as f64 * self.ankle_angle as f64 * ENC_CLICKS_TO_DEG
    }

    /// Motor velocity in deg/s in the anatomical frame.
    #[inline]
    pub fn motor_velocity_deg_s(&self, motor_sign: i32) -> f64 {
        motor_sign as f64 * self.motor_velocity as f64
    }

    /// Ankle velocity in deg/s in the anatomical frame.
    #[inline]
    pub fn ankle_velocity_deg_s(&self, ankle_encoder_sign: i32) -> f64 {
        ankle_encoder_sign as f64 * self.ankle_velocity as f64 / 10.0
    }
}

/// One sensor frame in engineering units, ready for the torque pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorFrame {
    /// Device-side timestamp [s].
    pub state_time_s: f64,
    pub accel_x_g: f64,
    pub accel_y_g: f64,
    pub accel_z_g: f64,
    pub gyro_x_deg_s: f64,
    pub gyro_y_deg_s: f64,
    pub gyro_z_deg_s: f64,
    /// Ankle angle relative to the session zero [deg].
    pub ankle_angle_deg: f64,
    pub ankle_velocity_deg_s: f64,
    /// Motor angle relative to the session zero [deg].
    pub motor_angle_deg: f64,
    pub motor_velocity_deg_s: f64,
    /// Winding current [mA], device sign frame.
    pub motor_current_ma: f64,
    pub motor_voltage_mv: f64,
    pub battery_current_ma: f64,
    pub battery_voltage_mv: f64,
    pub case_temperature_c: f64,
}

impl SensorFrame {
    /// Scale a raw frame with a device's sign conventions and the
    /// session's locked encoder zeros.
    pub fn from_raw(
        raw: &RawSensorFrame,
        identity: &DeviceIdentity,
        offsets: &CalibrationOffsets,
    ) -> Self {
        let motor_sign = identity.motor_sign as f64;
        Self {
            state_time_s: raw.state_time_ms as f64 / 1000.0,
            accel_x_g: raw.accel_x as f64 * ACCEL_LSB_TO_G,
            accel_y_g: raw.accel_y as f64 * ACCEL_LSB_TO_G,
            accel_z_g: raw.accel_z as f64 * ACCEL_LSB_TO_G,
            gyro_x_deg_s: raw.gyro_x as f64 * GYRO_LSB_TO_DEG_S,
            gyro_y_deg_s: raw.gyro_y as f64 * GYRO_LSB_TO_DEG_S,
            gyro_z_deg_s: raw.gyro_z as f64 * GYRO_LSB_TO_DEG_S,
            ankle_angle_deg: raw.ankle_angle_deg_unreferenced(identity.ankle_encoder_sign)
                - offsets.ankle_angle_zero_deg,
            ankle_velocity_deg_s: raw.ankle_velocity_deg_s(identity.ankle_encoder_sign),
            motor_angle_deg: motor_sign
                * (raw.motor_angle_deg_unreferenced() - offsets.motor_angle_zero_deg),
            motor_velocity_deg_s: raw.motor_velocity_deg_s(identity.motor_sign),
            motor_current_ma: raw.motor_current as f64,
            motor_voltage_mv: raw.motor_voltage as f64,
            battery_current_ma: raw.battery_current as f64,
            battery_voltage_mv: raw.battery_voltage as f64,
            case_temperature_c: raw.temperature as f64,
        }
    }
}
