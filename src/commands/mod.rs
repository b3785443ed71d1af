//! Command surface used by front ends (CLI today).
//!
//! Commands validate their input, call into the library modules and
//! flatten every error to a `String` message for display.

pub mod profile;
pub mod records;

/// Health check command, verifies the backend is wired up
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}
