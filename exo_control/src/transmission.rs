//! Angle-dependent transmission ratio of the belt drivetrain.
//!
//! An offline characterization fits motor angle as a cubic in ankle
//! angle. The instantaneous gear ratio is the slope of that fit, so the
//! model differentiates the cubic symbolically and samples the
//! derivative into a lookup table across the characterized ankle range.
//! Every sample is floored at the configured minimum ratio; a ratio
//! near zero would otherwise blow the current command up.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use exo_common::config::TransmissionConfig;

#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error("failed to read characterization file: {0}")]
    Io(String),

    #[error("characterization file {path}: {detail}")]
    Malformed { path: String, detail: String },
}

/// Derivative of a cubic, highest degree first.
fn differentiate(coeffs: [f64; 4]) -> [f64; 3] {
    [3.0 * coeffs[0], 2.0 * coeffs[1], coeffs[2]]
}

/// Offline characterization of one drivetrain.
///
/// The file layout is three CSV rows, coefficients highest degree
/// first: the cubic motor-angle fit, its derivative, and the ankle
/// angle offset recorded at characterization time.
#[derive(Debug, Clone, PartialEq)]
pub struct Characterization {
    pub motor_angle_coeffs: [f64; 4],
    pub ratio_coeffs: [f64; 3],
    pub angle_offset_deg: f64,
}

impl Characterization {
    /// Characterization carried inline in the session config.
    pub fn from_config(config: &TransmissionConfig) -> Self {
        Self {
            motor_angle_coeffs: config.motor_angle_coeffs,
            ratio_coeffs: differentiate(config.motor_angle_coeffs),
            angle_offset_deg: config.angle_offset_deg,
        }
    }

    /// Parse a characterization file written by the fitting tool.
    pub fn load(path: &Path) -> Result<Self, TransmissionError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| TransmissionError::Io(e.to_string()))?;
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() < 3 {
            return Err(TransmissionError::Malformed {
                path: path.display().to_string(),
                detail: format!("expected 3 rows, found {}", rows.len()),
            });
        }

        let cubic = parse_row(rows[0], 4, path)?;
        let derivative = parse_row(rows[1], 3, path)?;
        let offset = parse_row(rows[2], 1, path)?;

        Ok(Self {
            motor_angle_coeffs: [cubic[0], cubic[1], cubic[2], cubic[3]],
            ratio_coeffs: [derivative[0], derivative[1], derivative[2]],
            angle_offset_deg: offset[0],
        })
    }
}

fn parse_row(line: &str, expect: usize, path: &Path) -> Result<Vec<f64>, TransmissionError> {
    let values: Result<Vec<f64>, _> = line
        .split(',')
        .map(|field| field.trim().parse::<f64>())
        .collect();
    let values = values.map_err(|e| TransmissionError::Malformed {
        path: path.display().to_string(),
        detail: format!("bad coefficient in '{line}': {e}"),
    })?;
    if values.len() != expect {
        return Err(TransmissionError::Malformed {
            path: path.display().to_string(),
            detail: format!("expected {expect} coefficients, found {}", values.len()),
        });
    }
    Ok(values)
}

/// One ratio query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioSample {
    pub ratio: f64,
    /// The queried angle fell outside the characterized range.
    pub clamped: bool,
}

/// Precomputed ankle angle → instantaneous gear ratio table.
///
/// Read-only after construction; lookups are a clamp and an index.
#[derive(Debug, Clone)]
pub struct TransmissionRatioModel {
    min_angle_deg: f64,
    max_angle_deg: f64,
    step_deg: f64,
    table: Vec<f64>,
}

impl TransmissionRatioModel {
    /// Build the model from the session config, loading the
    /// characterization file when one is configured.
    pub fn from_config(config: &TransmissionConfig) -> Result<Self, TransmissionError> {
        let characterization = match &config.characterization_path {
            Some(path) => Characterization::load(path)?,
            None => Characterization::from_config(config),
        };
        Ok(Self::build(&characterization, config))
    }

    /// Sample the symbolic derivative of the motor-angle fit across the
    /// configured range.
    pub fn build(characterization: &Characterization, config: &TransmissionConfig) -> Self {
        let symbolic = differentiate(characterization.motor_angle_coeffs);
        if !coeffs_close(&symbolic, &characterization.ratio_coeffs) {
            warn!(
                "stored derivative {:?} disagrees with the cubic fit; using the symbolic derivative {:?}",
                characterization.ratio_coeffs, symbolic
            );
        }

        let step_deg =
            (config.max_angle_deg - config.min_angle_deg) / (config.granularity - 1) as f64;
        let mut table = Vec::with_capacity(config.granularity);
        for i in 0..config.granularity {
            let angle = config.min_angle_deg + i as f64 * step_deg;
            let x = angle - characterization.angle_offset_deg;
            let ratio = (symbolic[0] * x + symbolic[1]) * x + symbolic[2];
            table.push(ratio.max(config.min_ratio));
        }

        debug!(
            "transmission table: {} samples over [{}, {}] deg, ratio {}..{}",
            table.len(),
            config.min_angle_deg,
            config.max_angle_deg,
            table.iter().cloned().fold(f64::INFINITY, f64::min),
            table.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        );

        Self {
            min_angle_deg: config.min_angle_deg,
            max_angle_deg: config.max_angle_deg,
            step_deg,
            table,
        }
    }

    /// Ratio at the given ankle angle [deg].
    ///
    /// Angles outside the characterized range are clamped to its edge
    /// and flagged; the caller records the warning, the returned ratio
    /// stays usable.
    pub fn lookup(&self, angle_deg: f64) -> RatioSample {
        let clamped_angle = angle_deg.clamp(self.min_angle_deg, self.max_angle_deg);
        let clamped = clamped_angle != angle_deg;
        let index = ((clamped_angle - self.min_angle_deg) / self.step_deg).round() as usize;
        let index = index.min(self.table.len() - 1);
        RatioSample {
            ratio: self.table[index],
            clamped,
        }
    }

    /// Characterized ankle range [deg].
    pub fn angle_range_deg(&self) -> (f64, f64) {
        (self.min_angle_deg, self.max_angle_deg)
    }
}

fn coeffs_close(a: &[f64; 3], b: &[f64; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
}
