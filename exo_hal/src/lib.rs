//! Exo Transport Layer
//!
//! This crate isolates the control loops from the ankle actuator wire
//! protocol. Everything above it talks in the [`device::AnkleTransport`]
//! trait and engineering-unit [`frame::SensorFrame`]s; everything below
//! it is a pluggable backend (vendor transport, bench simulator).
//!
//! # Module Structure
//!
//! - [`device`] - Transport trait, current-loop gains and device errors
//! - [`frame`] - Raw device frames and their engineering-unit scaling
//! - [`identity`] - Device id → side/sign registry
//! - [`deadline`] - Post-hoc deadline guard around per-cycle calls
//! - [`sim`] - Deterministic scripted backend for benches and tests

pub mod deadline;
pub mod device;
pub mod frame;
pub mod identity;
pub mod sim;
