//! Exo Common Library
//!
//! This crate provides the shared constants, coordination primitives and
//! configuration loading utilities for all exo workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Actuator and drivetrain constants
//! - [`state`] - Session/lifecycle state machines and their atomic cells
//! - [`fault`] - Per-cycle fault flags and counters
//! - [`config`] - Configuration loading traits and types
//! - [`estimate`] - Gait estimate exchange between estimator and control threads
//! - [`record`] - Fixed-layout per-cycle telemetry record
//! - [`filter`] - Fixed-window filters used by calibration and period tracking
//! - [`offsets`] - Encoder zero offsets and their on-disk format
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! exo = { package = "exo_common", path = "../exo_common" }
//! ```
//!
//! Then import:
//! ```rust
//! # extern crate exo_common as exo;
//! use exo::consts::*;
//! use exo::config::{ConfigLoader, SessionConfig};
//! ```

pub mod config;
pub mod consts;
pub mod estimate;
pub mod fault;
pub mod filter;
pub mod offsets;
pub mod prelude;
pub mod record;
pub mod state;
