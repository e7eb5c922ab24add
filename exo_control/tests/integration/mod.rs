mod common;

mod calibration;
mod remote_control;
mod scheduling;
mod thermal_stop;
mod torque_pipeline;
