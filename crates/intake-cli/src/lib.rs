//! Support code for the `intake_check` binary.

pub mod report;
pub mod telemetry;
