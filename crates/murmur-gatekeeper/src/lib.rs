//! Murmur Gatekeeper
//!
//! Validates request payloads at the boundary, before anything reaches the
//! store.
//!
//! The Gatekeeper provides:
//! - Username, email and password rules for registration
//! - Length limits for profiles, posts and comments
//! - Username availability checking against a [`UserStore`](murmur_domain::traits::UserStore)
//!
//! # Examples
//!
//! ```
//! use murmur_domain::PostDraft;
//! use murmur_gatekeeper::{Gatekeeper, ValidationConfig, ValidationStatus};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let draft = PostDraft { title: "Hello".into(), content: "First post".into() };
//! assert_eq!(gatekeeper.validate_post(&draft).status, ValidationStatus::Accepted);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::GatekeeperError;
pub use validator::{Gatekeeper, RejectionReason, ValidationResult, ValidationStatus};
