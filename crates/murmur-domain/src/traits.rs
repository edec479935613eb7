//! Trait definitions for storage
//!
//! These traits define the boundary between domain logic and infrastructure.
//! The SQLite implementation lives in murmur-store.
//!
//! Edge writes are insert-if-absent / delete-if-present and report what
//! happened through [`Insertion`], [`Removal`] and [`LikeInsertion`]. Each call
//! must be atomic with respect to concurrent callers on the same pair.

use crate::{
    Comment, CommentId, CommentUpdate, FollowCounts, FollowEdge, Insertion, LikeEdge,
    LikeInsertion, Notification, Page, PageRequest, Post, PostId, PostQuery, PostUpdate,
    ProfileUpdate, Removal, User, UserId,
};

/// Common error type shared by all store traits of one backend
pub trait Storage {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;
}

/// The follow graph
pub trait RelationStore: Storage {
    /// Insert `follower → followee` unless it already exists
    fn follow(&mut self, follower: UserId, followee: UserId) -> Result<Insertion, Self::Error>;

    /// Delete `follower → followee` if it exists
    fn unfollow(&mut self, follower: UserId, followee: UserId) -> Result<Removal, Self::Error>;

    /// The edge `a → b`, if present
    fn follow_edge(&self, a: UserId, b: UserId) -> Result<Option<FollowEdge>, Self::Error>;

    /// Whether `a` follows `b`
    fn is_following(&self, a: UserId, b: UserId) -> Result<bool, Self::Error> {
        Ok(self.follow_edge(a, b)?.is_some())
    }

    /// Users following `user`
    fn followers(&self, user: UserId, page: PageRequest) -> Result<Page<User>, Self::Error>;

    /// Users that `user` follows
    fn following(&self, user: UserId, page: PageRequest) -> Result<Page<User>, Self::Error>;

    /// Follower / following totals for `user`
    fn follow_counts(&self, user: UserId) -> Result<FollowCounts, Self::Error>;
}

/// Likes on posts, with the notification side effect
pub trait InteractionLedger: Storage {
    /// Insert `user → post` unless it already exists
    ///
    /// When the edge is created and `user` is not the post's author, exactly one
    /// notification for the author is written in the same transaction.
    fn like(&mut self, user: UserId, post: PostId) -> Result<LikeInsertion, Self::Error>;

    /// Delete `user → post` if it exists; notifications are left alone
    fn unlike(&mut self, user: UserId, post: PostId) -> Result<Removal, Self::Error>;

    /// The edge `user → post`, if present
    fn like_edge(&self, user: UserId, post: PostId) -> Result<Option<LikeEdge>, Self::Error>;

    /// Whether `user` likes `post`
    fn is_liked(&self, user: UserId, post: PostId) -> Result<bool, Self::Error> {
        Ok(self.like_edge(user, post)?.is_some())
    }

    /// Number of likes on `post`
    fn like_count(&self, post: PostId) -> Result<u64, Self::Error>;
}

/// Registered users
pub trait UserStore: Storage {
    /// Insert a user with its password hash
    ///
    /// Returns [`Insertion::AlreadyPresent`] if the username is taken.
    fn create_user(&mut self, user: &User, password_hash: &str) -> Result<Insertion, Self::Error>;

    /// Get a user by ID
    fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// Get a user by username
    fn find_by_username(&self, username: &str) -> Result<Option<User>, Self::Error>;

    /// Get a user together with the stored password hash
    fn credentials(&self, username: &str) -> Result<Option<(User, String)>, Self::Error>;

    /// List users ordered by username
    fn list_users(&self, page: PageRequest) -> Result<Page<User>, Self::Error>;

    /// Apply a partial update; `None` if the user does not exist
    fn update_profile(
        &mut self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, Self::Error>;
}

/// Posts and the follow feed
pub trait PostStore: Storage {
    /// Insert a new post
    fn create_post(&mut self, post: &Post) -> Result<(), Self::Error>;

    /// Get a post by ID
    fn get_post(&self, id: PostId) -> Result<Option<Post>, Self::Error>;

    /// List posts matching `query`, newest first
    fn list_posts(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>, Self::Error>;

    /// Apply a partial update; `None` if the post does not exist
    fn update_post(
        &mut self,
        id: PostId,
        update: &PostUpdate,
        updated_at: u64,
    ) -> Result<Option<Post>, Self::Error>;

    /// Delete a post with its likes and comments; false if it did not exist
    fn delete_post(&mut self, id: PostId) -> Result<bool, Self::Error>;

    /// Posts by users that `user` follows, newest first
    fn feed(&self, user: UserId, page: PageRequest) -> Result<Page<Post>, Self::Error>;
}

/// Comments on posts
pub trait CommentStore: Storage {
    /// Insert a new comment
    fn create_comment(&mut self, comment: &Comment) -> Result<(), Self::Error>;

    /// Get a comment by ID
    fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, Self::Error>;

    /// Comments on `post`, oldest first
    fn list_comments(&self, post: PostId, page: PageRequest)
        -> Result<Page<Comment>, Self::Error>;

    /// Apply `update` and stamp `updated_at`; `None` if the comment does not exist
    fn update_comment(
        &mut self,
        id: CommentId,
        update: &CommentUpdate,
        updated_at: u64,
    ) -> Result<Option<Comment>, Self::Error>;

    /// Delete a comment; false if it did not exist
    fn delete_comment(&mut self, id: CommentId) -> Result<bool, Self::Error>;
}

/// Read side of notifications (they are written by [`InteractionLedger::like`])
pub trait NotificationStore: Storage {
    /// Notifications addressed to `recipient`, newest first
    fn notifications_for(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>, Self::Error>;
}

/// Everything the social service needs from one backend
pub trait SocialStore:
    RelationStore + InteractionLedger + UserStore + PostStore + CommentStore + NotificationStore
{
}

impl<T> SocialStore for T where
    T: RelationStore + InteractionLedger + UserStore + PostStore + CommentStore + NotificationStore
{
}
