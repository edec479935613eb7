//! JSON request and response bodies.
//!
//! Ids are rendered as hyphenated UUID strings and timestamps as Unix epoch
//! milliseconds.

use murmur_domain::{Comment, Notification, Page, Post, User};
use murmur_social::Profile;
use serde::{Deserialize, Serialize};

/// POST /accounts/register
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Unique username
    pub username: String,
    /// Email address
    pub email: String,
    /// Plain password; hashed before storage
    pub password: String,
    /// Optional biography
    #[serde(default)]
    pub bio: String,
}

/// POST /accounts/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username
    pub username: String,
    /// Plain password
    pub password: String,
}

/// PATCH /accounts/profile
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    /// New email address
    pub email: Option<String>,
    /// New biography
    pub bio: Option<String>,
}

/// POST /posts
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    /// Title
    pub title: String,
    /// Body
    pub content: String,
}

/// PATCH /posts/:id
#[derive(Debug, Default, Deserialize)]
pub struct PostUpdateRequest {
    /// New title
    pub title: Option<String>,
    /// New body
    pub content: Option<String>,
}

/// POST /posts/:id/comments
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    /// Comment text
    pub content: String,
}

/// PATCH /comments/:id
#[derive(Debug, Default, Deserialize)]
pub struct CommentUpdateRequest {
    /// New text
    pub content: Option<String>,
}

/// `?page=&page_size=`
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<usize>,
    /// Items per page
    pub page_size: Option<usize>,
}

/// `GET /posts` query string
#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    /// 1-based page number
    pub page: Option<usize>,
    /// Items per page
    pub page_size: Option<usize>,
    /// Substring to look for in title or body
    pub search: Option<String>,
    /// Restrict to one author (user id)
    pub author: Option<String>,
}

/// A user as seen over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User id
    pub id: String,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Biography
    pub bio: String,
    /// Staff flag
    pub is_staff: bool,
    /// Registration time
    pub created_at: u64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            bio: user.bio,
            is_staff: user.is_staff,
            created_at: user.created_at,
        }
    }
}

/// A user with follow totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// The user
    #[serde(flatten)]
    pub user: UserResponse,
    /// Number of followers
    pub followers: u64,
    /// Number of users followed
    pub following: u64,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user: profile.user.into(),
            followers: profile.counts.followers,
            following: profile.counts.following,
        }
    }
}

/// Register / login result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The authenticated user
    pub user: UserResponse,
    /// Bearer token for later requests
    pub token: String,
}

/// A post as seen over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    /// Post id
    pub id: String,
    /// Author's user id
    pub author: String,
    /// Title
    pub title: String,
    /// Body
    pub content: String,
    /// Creation time
    pub created_at: u64,
    /// Last edit time
    pub updated_at: u64,
    /// Like total; only present on single-post reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_string(),
            author: post.author.to_string(),
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
            likes: None,
        }
    }
}

/// A comment as seen over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    /// Comment id
    pub id: String,
    /// Post id
    pub post: String,
    /// Author's user id
    pub author: String,
    /// Text
    pub content: String,
    /// Creation time
    pub created_at: u64,
    /// Last edit time
    pub updated_at: u64,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            post: comment.post.to_string(),
            author: comment.author.to_string(),
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// A notification as seen over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResponse {
    /// Notification id
    pub id: String,
    /// Who receives it
    pub recipient: String,
    /// Who caused it
    pub actor: String,
    /// What happened, e.g. "liked your post"
    pub verb: String,
    /// Post the notification is about; null once the post is deleted
    pub target: Option<String>,
    /// Creation time
    pub created_at: u64,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.to_string(),
            recipient: n.recipient.to_string(),
            actor: n.actor.to_string(),
            verb: n.verb,
            target: n.target.map(|p| p.to_string()),
            created_at: n.created_at,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total items across all pages
    pub total: u64,
    /// 1-based page number
    pub page: usize,
    /// Page size used
    pub page_size: usize,
    /// Whether another page follows
    pub has_next: bool,
}

impl<T> PageResponse<T> {
    /// Convert a domain page, mapping each item
    pub fn from_page<U: Into<T>>(page: Page<U>) -> Self {
        let has_next = page.has_next();
        let page = page.map(Into::into);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            has_next,
        }
    }
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    /// Human-readable message
    pub detail: String,
    /// False when the request was a no-op
    pub changed: bool,
}

/// GET /health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests
    pub status: String,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Individual validation failures, when there are any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}
