//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use exo_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use exo_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SessionConfig, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{
    BIAS_CURRENT_MA, CONTROL_RATE_HZ, DRIVETRAIN_EFFICIENCY, MAX_ALLOWABLE_CURRENT_MA,
    TORQUE_CONSTANT_NM_PER_MA,
};

// ─── Coordination ───────────────────────────────────────────────────
pub use crate::state::{
    LifecycleCell, LifecycleState, SessionMode, SessionSignals, Side, SignalSnapshot,
};

// ─── Gait Estimates ─────────────────────────────────────────────────
pub use crate::estimate::{EstimateSlot, GaitEstimate, SessionClock};

// ─── Telemetry ──────────────────────────────────────────────────────
pub use crate::fault::{CycleFault, FaultCounters};
pub use crate::record::CycleRecord;

// ─── Calibration ────────────────────────────────────────────────────
pub use crate::offsets::CalibrationOffsets;
