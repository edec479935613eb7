//! Edges of the social graph
//!
//! Two edge sets exist: follows (user → user) and likes (user → post). Both are
//! sets, so a pair appears at most once; stores report whether a write
//! actually changed the set instead of failing on duplicates.

use crate::{Notification, PostId, UserId};

/// "follower follows followee"
///
/// Edges are created by a follow and destroyed by an unfollow. They are never
/// mutated and never self-loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowEdge {
    /// User doing the following
    pub follower: UserId,

    /// User being followed
    pub followee: UserId,

    /// When the edge was created (milliseconds since Unix epoch)
    pub created_at: u64,
}

/// "user likes post"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LikeEdge {
    /// User who liked the post
    pub user: UserId,

    /// Post that was liked
    pub post: PostId,

    /// When the edge was created (milliseconds since Unix epoch)
    pub created_at: u64,
}

/// Result of an insert-if-absent on an edge set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The edge did not exist and was inserted
    Created,

    /// The edge already existed; nothing was written
    AlreadyPresent,
}

/// Result of a delete-if-present on an edge set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The edge existed and was deleted
    Removed,

    /// The edge did not exist; nothing was written
    Absent,
}

/// Result of recording a like
///
/// The notification is written in the same transaction as the edge, so a
/// notification exists only when the edge was created by this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeInsertion {
    /// The like was recorded. `notification` is `None` for a self-like.
    Created {
        /// Notification sent to the post author
        notification: Option<Notification>,
    },

    /// The user had already liked the post
    AlreadyPresent,
}

impl LikeInsertion {
    /// Whether this call recorded a new like
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}
