//! Posts and comments

use crate::{CommentId, PostId, UserId};

/// A post: the content item that users like and comment on
///
/// A post has exactly one author. Its lifecycle is independent of likes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Unique identifier
    pub id: PostId,

    /// Owner of the post
    pub author: UserId,

    /// Title
    pub title: String,

    /// Body text
    pub content: String,

    /// Creation time (milliseconds since Unix epoch)
    pub created_at: u64,

    /// Last edit time (milliseconds since Unix epoch)
    pub updated_at: u64,
}

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Unique identifier
    pub id: CommentId,

    /// Post being commented on
    pub post: PostId,

    /// Owner of the comment
    pub author: UserId,

    /// Body text
    pub content: String,

    /// Creation time (milliseconds since Unix epoch)
    pub created_at: u64,

    /// Last edit time (milliseconds since Unix epoch)
    pub updated_at: u64,
}

/// Fields supplied when creating a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
}

/// Partial post update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostUpdate {
    /// New title
    pub title: Option<String>,
    /// New body text
    pub content: Option<String>,
}

/// Fields supplied when commenting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    /// Body text
    pub content: String,
}

/// Partial comment update; `None` leaves the text unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentUpdate {
    /// New body text
    pub content: Option<String>,
}

/// Query criteria for listing posts
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Case-insensitive substring match over title and content
    pub search: Option<String>,

    /// Restrict to one author
    pub author: Option<UserId>,
}
