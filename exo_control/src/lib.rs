//! # Exo Control Library
//!
//! Soft real-time actuator control for a pair of powered ankle
//! exoskeletons. One control thread per worn boot computes and issues a
//! current command at the configured loop rate, paced by an
//! absolute-deadline scheduler, coordinated through shared session
//! signals, and guarded by a lumped thermal model of the motor winding.
//!
//! ## Per-Cycle Pipeline
//!
//! 1. Read a sensor frame through the deadline-guarded transport.
//! 2. Snapshot the gait estimate and locate the cycle within the stride.
//! 3. Sample the assistance profile for the desired ankle torque.
//! 4. Convert torque to motor current through the transmission ratio.
//! 5. Clamp, run the thermal gate, and issue the signed command.
//! 6. Append the cycle record and sleep until the next deadline.
//!
//! ## Ownership
//!
//! Each actuator thread exclusively owns its device handle, sensor
//! frame, and thermal state. The only state crossing thread boundaries
//! is the gait-estimate slot, the session signals, and the telemetry
//! sink, each internally synchronized.

#![deny(clippy::disallowed_types)]

pub mod actuator;
pub mod assistance;
pub mod calibration;
pub mod error;
pub mod lifecycle;
pub mod rt;
pub mod scheduler;
pub mod telemetry;
pub mod thermal;
pub mod transmission;
