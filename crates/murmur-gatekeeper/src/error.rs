//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper operations
///
/// A payload that fails validation is not an error; it yields a rejected
/// [`ValidationResult`](crate::ValidationResult).
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Store error during validation
    #[error("Store error: {0}")]
    Store(String),
}
