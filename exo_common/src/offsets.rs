//! Encoder zero offsets and their on-disk format.
//!
//! Zeroing locks one offset pair per side per session. The pair is
//! persisted as a single CSV line so bench tooling can replay a session
//! against the same zero frame.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::Side;

/// Errors from reading or writing an offsets file.
#[derive(Debug, Error)]
pub enum OffsetsError {
    #[error("offsets file I/O failed: {0}")]
    Io(String),

    #[error("malformed offsets file '{path}': {detail}")]
    Malformed { path: String, detail: String },
}

/// Encoder zero angles locked by the calibration procedure [deg].
///
/// `motor_angle_zero_deg` is in the unsigned device frame;
/// `ankle_angle_zero_deg` is in the signed anatomical frame. Both are
/// subtracted before any angle reaches the torque pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOffsets {
    pub motor_angle_zero_deg: f64,
    pub ankle_angle_zero_deg: f64,
}

impl CalibrationOffsets {
    /// File name this side's offsets persist under.
    pub fn file_name(side: Side) -> String {
        format!("offsets_{}.csv", side.label())
    }

    /// Full path for this side's offsets under `dir`.
    pub fn path_for(dir: &Path, side: Side) -> PathBuf {
        dir.join(Self::file_name(side))
    }

    /// Persist to `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path, side: Side) -> Result<PathBuf, OffsetsError> {
        std::fs::create_dir_all(dir).map_err(|e| OffsetsError::Io(e.to_string()))?;
        let path = Self::path_for(dir, side);
        let line = format!(
            "{},{}\n",
            self.motor_angle_zero_deg, self.ankle_angle_zero_deg
        );
        std::fs::write(&path, line).map_err(|e| OffsetsError::Io(e.to_string()))?;
        Ok(path)
    }

    /// Load a previously persisted pair.
    pub fn load(dir: &Path, side: Side) -> Result<Self, OffsetsError> {
        let path = Self::path_for(dir, side);
        let content =
            std::fs::read_to_string(&path).map_err(|e| OffsetsError::Io(e.to_string()))?;
        Self::parse(&content).map_err(|detail| OffsetsError::Malformed {
            path: path.display().to_string(),
            detail,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        let line = content
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| "file is empty".to_string())?;
        let mut parts = line.split(',');
        let motor = parts
            .next()
            .ok_or_else(|| "missing motor offset".to_string())?
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("bad motor offset: {e}"))?;
        let ankle = parts
            .next()
            .ok_or_else(|| "missing ankle offset".to_string())?
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("bad ankle offset: {e}"))?;
        if parts.next().is_some() {
            return Err("expected exactly two values".to_string());
        }
        Ok(Self {
            motor_angle_zero_deg: motor,
            ankle_angle_zero_deg: ankle,
        })
    }
}
