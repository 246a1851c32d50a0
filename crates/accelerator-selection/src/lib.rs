//! Selection pipeline core for accelerator-program events.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
