//! Users and the account payloads that create or modify them

use crate::UserId;

/// A registered user
///
/// The password hash never leaves the store; it is not part of this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Unique handle
    pub username: String,

    /// Contact email
    pub email: String,

    /// Free-form profile text
    pub bio: String,

    /// Staff members may moderate content they do not own
    pub is_staff: bool,

    /// Registration time (milliseconds since Unix epoch)
    pub created_at: u64,
}

/// Follower and following totals for a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowCounts {
    /// Users following this user
    pub followers: u64,

    /// Users this user follows
    pub following: u64,
}

/// Fields supplied when registering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Requested handle
    pub username: String,
    /// Contact email
    pub email: String,
    /// Plain-text password, hashed before it is stored
    pub password: String,
    /// Optional profile text
    pub bio: String,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New email
    pub email: Option<String>,
    /// New profile text
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// True when the update changes nothing
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.bio.is_none()
    }
}
