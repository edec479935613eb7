//! Social service error types

use murmur_domain::Denied;
use murmur_gatekeeper::RejectionReason;
use thiserror::Error;

/// Errors returned by [`SocialService`](crate::SocialService) operations
///
/// All of these are request-local; none is fatal to the process.
#[derive(Error, Debug)]
pub enum SocialError {
    /// The actor targeted itself (e.g. self-follow)
    #[error("{0}")]
    SelfReference(String),

    /// The requested edge already exists
    #[error("{0}")]
    AlreadyExists(String),

    /// The edge to remove does not exist
    #[error("{0}")]
    NotFound(String),

    /// The user, post or comment the request names does not exist
    #[error("{0}")]
    MissingTarget(String),

    /// No authenticated actor
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    /// The actor lacks the capability for this operation
    #[error("{0}")]
    Forbidden(String),

    /// Username or password did not match
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The payload failed boundary validation
    #[error("Validation failed: {}", format_reasons(.0))]
    Invalid(Vec<RejectionReason>),

    /// Storage failure
    #[error("Store error: {0}")]
    Store(String),

    /// Unexpected internal failure (e.g. password hashing)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SocialError {
    /// True for both flavours of "not found": missing edge or missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, SocialError::NotFound(_) | SocialError::MissingTarget(_))
    }
}

impl From<Denied> for SocialError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => SocialError::Unauthenticated,
            other @ Denied::NotOwner { .. } => SocialError::Forbidden(other.to_string()),
        }
    }
}

fn format_reasons(reasons: &[RejectionReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Wrap any store error
pub(crate) fn store_err<E: std::fmt::Display>(e: E) -> SocialError {
    SocialError::Store(e.to_string())
}
