//! Metric computation for in-game athlete action tracking.

pub mod config;
pub mod error;
pub mod stats;
pub mod telemetry;
