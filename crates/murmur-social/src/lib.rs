//! Murmur Social
//!
//! The application layer between the HTTP router and the store. It owns the
//! ordering of every operation: capability check, self-reference check, target
//! lookup, the atomic store write, then the duplicate policy.
//!
//! # Examples
//!
//! ```no_run
//! use murmur_domain::{Registration, RequestContext};
//! use murmur_gatekeeper::Gatekeeper;
//! use murmur_social::{ServiceOptions, SocialService};
//! use murmur_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("murmur.db")?;
//! let mut service = SocialService::new(store, Gatekeeper::default_config(), ServiceOptions::default());
//!
//! let alice = service.register(Registration {
//!     username: "alice".into(),
//!     email: "alice@example.com".into(),
//!     password: "correct horse".into(),
//!     bio: String::new(),
//! })?;
//! let feed = service.feed(&RequestContext::user(alice.id), service.page_request(None, None))?;
//! assert!(feed.items.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod password;
mod service;

pub use error::SocialError;
pub use password::{check_login, hash_password, verify_password};
pub use service::{EdgeOutcome, NewAccount, PostDetails, Profile, ServiceOptions, SocialService};
