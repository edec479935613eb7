//! Notifications emitted as side effects of interactions

use crate::{NotificationId, PostId, UserId};

/// Verb recorded when someone likes a post
pub const LIKED_YOUR_POST: &str = "liked your post";

/// An immutable record telling `recipient` that `actor` did something
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Unique identifier
    pub id: NotificationId,

    /// User being notified
    pub recipient: UserId,

    /// User who caused the notification
    pub actor: UserId,

    /// Human-readable action, e.g. "liked your post"
    pub verb: String,

    /// Post the action was about; `None` once that post is deleted
    pub target: Option<PostId>,

    /// Emission time (milliseconds since Unix epoch)
    pub created_at: u64,
}

impl Notification {
    /// Build the notification for `actor` liking `post` owned by `recipient`
    pub fn liked_post(recipient: UserId, actor: UserId, post: PostId, created_at: u64) -> Self {
        Self {
            id: NotificationId::new(),
            recipient,
            actor,
            verb: LIKED_YOUR_POST.to_string(),
            target: Some(post),
            created_at,
        }
    }
}
