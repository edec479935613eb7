//! Murmur Domain Layer
//!
//! This crate contains the domain model for Murmur, a small social backend.
//! Apart from `uuid` for identifiers it has no external dependencies; it
//! defines the entities, value objects, capability checks and the store traits
//! that every other layer depends upon.
//!
//! ## Key Concepts
//!
//! - **Follow edge**: "A follows B", unique per ordered pair, never a self-loop
//! - **Like edge**: "A likes post P", unique per pair
//! - **Notification**: emitted once when someone else's post is first liked
//! - **Request context**: the acting identity, passed explicitly to every operation
//!
//! ## Architecture
//!
//! - Pure types and predicates only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all storage interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod context;
pub mod edge;
pub mod id;
pub mod notification;
pub mod page;
pub mod policy;
pub mod post;
pub mod traits;
pub mod user;

// Re-exports for convenience
pub use clock::now_millis;
pub use context::{require_authenticated, require_owner_or_staff, Denied, RequestContext};
pub use edge::{FollowEdge, Insertion, LikeEdge, LikeInsertion, Removal};
pub use id::{CommentId, InvalidId, NotificationId, PostId, UserId};
pub use notification::{Notification, LIKED_YOUR_POST};
pub use page::{Page, PageRequest};
pub use policy::DuplicatePolicy;
pub use post::{Comment, CommentDraft, CommentUpdate, Post, PostDraft, PostQuery, PostUpdate};
pub use user::{FollowCounts, ProfileUpdate, Registration, User};
