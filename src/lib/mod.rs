//! Shared library modules providing error types, version facts, and telemetry initialization.

pub mod errors;
pub mod telemetry;
pub mod version;
