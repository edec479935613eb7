//! The social service: every operation exposed to the HTTP layer

use crate::error::store_err;
use crate::password::{check_login, hash_password};
use crate::SocialError;
use murmur_domain::traits::SocialStore;
use murmur_domain::{
    now_millis, require_authenticated, require_owner_or_staff, Comment, CommentDraft, CommentId,
    CommentUpdate, DuplicatePolicy, FollowCounts, Insertion, LikeInsertion, Notification, Page, PageRequest,
    Post, PostDraft, PostId, PostQuery, PostUpdate, ProfileUpdate, Registration, Removal,
    RequestContext, User, UserId,
};
use murmur_gatekeeper::{Gatekeeper, RejectionReason, ValidationResult};
use tracing::{debug, info, warn};

/// Tunables for [`SocialService`]
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// How duplicate follow/like and absent unfollow/unlike are reported
    pub duplicate_policy: DuplicatePolicy,

    /// Page size when the caller gives none
    pub default_page_size: usize,

    /// Upper bound on any requested page size
    pub max_page_size: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// What an edge toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeOutcome {
    /// False when the call was a no-op under [`DuplicatePolicy::Ignore`]
    pub changed: bool,

    /// Notification emitted by a like, if any
    pub notification: Option<Notification>,
}

impl EdgeOutcome {
    fn changed() -> Self {
        Self {
            changed: true,
            notification: None,
        }
    }

    fn unchanged() -> Self {
        Self {
            changed: false,
            notification: None,
        }
    }
}

/// A user together with follow totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// The user
    pub user: User,

    /// Follower / following totals
    pub counts: FollowCounts,
}

/// A post together with its like total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDetails {
    /// The post
    pub post: Post,

    /// Number of likes
    pub likes: u64,
}

/// A validated registration waiting for its password hash
pub struct NewAccount {
    /// The user to insert
    pub user: User,

    /// Plain password to hash
    pub password: String,
}

/// Application service over a [`SocialStore`]
///
/// Each operation receives the acting identity as a [`RequestContext`] and
/// begins with its capability check.
pub struct SocialService<S> {
    store: S,
    gatekeeper: Gatekeeper,
    options: ServiceOptions,
}

impl<S: SocialStore> SocialService<S> {
    /// Create a service over `store`
    pub fn new(store: S, gatekeeper: Gatekeeper, options: ServiceOptions) -> Self {
        Self {
            store,
            gatekeeper,
            options,
        }
    }

    /// Shared access to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Exclusive access to the underlying store
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Build a clamped page request from optional query parameters
    pub fn page_request(&self, page: Option<usize>, page_size: Option<usize>) -> PageRequest {
        PageRequest::new(
            page.unwrap_or(1),
            page_size.unwrap_or(self.options.default_page_size),
            self.options.max_page_size,
        )
    }

    // ----------------------------------------------------------------------
    // Relation store
    // ----------------------------------------------------------------------

    /// Make the actor follow `target`
    ///
    /// # Errors
    ///
    /// - [`SocialError::SelfReference`] when `target` is the actor
    /// - [`SocialError::MissingTarget`] when `target` does not exist
    /// - [`SocialError::AlreadyExists`] when already following (reject policy)
    pub fn follow(
        &mut self,
        ctx: &RequestContext,
        target: UserId,
    ) -> Result<EdgeOutcome, SocialError> {
        let actor = require_authenticated(ctx)?;

        if actor == target {
            return Err(SocialError::SelfReference(
                "You cannot follow yourself.".to_string(),
            ));
        }
        let followee = self.existing_user(target)?;

        match self.store.follow(actor, target).map_err(store_err)? {
            Insertion::Created => {
                info!(follower = %actor, followee = %target, "follow created");
                Ok(EdgeOutcome::changed())
            }
            Insertion::AlreadyPresent => match self.options.duplicate_policy {
                DuplicatePolicy::Reject => Err(SocialError::AlreadyExists(format!(
                    "You are already following {}.",
                    followee.username
                ))),
                DuplicatePolicy::Ignore => {
                    debug!(follower = %actor, followee = %target, "duplicate follow ignored");
                    Ok(EdgeOutcome::unchanged())
                }
            },
        }
    }

    /// Make the actor stop following `target`
    ///
    /// # Errors
    ///
    /// - [`SocialError::MissingTarget`] when `target` does not exist
    /// - [`SocialError::NotFound`] when not following (reject policy)
    pub fn unfollow(
        &mut self,
        ctx: &RequestContext,
        target: UserId,
    ) -> Result<EdgeOutcome, SocialError> {
        let actor = require_authenticated(ctx)?;
        let followee = self.existing_user(target)?;

        match self.store.unfollow(actor, target).map_err(store_err)? {
            Removal::Removed => {
                info!(follower = %actor, followee = %target, "follow removed");
                Ok(EdgeOutcome::changed())
            }
            Removal::Absent => match self.options.duplicate_policy {
                DuplicatePolicy::Reject => Err(SocialError::NotFound(format!(
                    "You are not following {}.",
                    followee.username
                ))),
                DuplicatePolicy::Ignore => {
                    debug!(follower = %actor, followee = %target, "unfollow of absent edge ignored");
                    Ok(EdgeOutcome::unchanged())
                }
            },
        }
    }

    /// Whether `a` follows `b`
    pub fn is_following(&self, a: UserId, b: UserId) -> Result<bool, SocialError> {
        self.store.is_following(a, b).map_err(store_err)
    }

    /// Users following `user`
    pub fn followers(&self, user: UserId, page: PageRequest) -> Result<Page<User>, SocialError> {
        self.existing_user(user)?;
        self.store.followers(user, page).map_err(store_err)
    }

    /// Users that `user` follows
    pub fn following(&self, user: UserId, page: PageRequest) -> Result<Page<User>, SocialError> {
        self.existing_user(user)?;
        self.store.following(user, page).map_err(store_err)
    }

    // ----------------------------------------------------------------------
    // Interaction ledger
    // ----------------------------------------------------------------------

    /// Record that the actor likes `post`
    ///
    /// The post's author is notified unless the actor is the author.
    ///
    /// # Errors
    ///
    /// - [`SocialError::MissingTarget`] when the post does not exist
    /// - [`SocialError::AlreadyExists`] when already liked (reject policy)
    pub fn like(&mut self, ctx: &RequestContext, post: PostId) -> Result<EdgeOutcome, SocialError> {
        let actor = require_authenticated(ctx)?;
        self.existing_post(post)?;

        match self.store.like(actor, post).map_err(store_err)? {
            LikeInsertion::Created { notification } => {
                info!(user = %actor, post = %post, notified = notification.is_some(), "like created");
                Ok(EdgeOutcome {
                    changed: true,
                    notification,
                })
            }
            LikeInsertion::AlreadyPresent => match self.options.duplicate_policy {
                DuplicatePolicy::Reject => Err(SocialError::AlreadyExists(
                    "You already liked this post.".to_string(),
                )),
                DuplicatePolicy::Ignore => {
                    debug!(user = %actor, post = %post, "duplicate like ignored");
                    Ok(EdgeOutcome::unchanged())
                }
            },
        }
    }

    /// Remove the actor's like from `post`; earlier notifications stay
    ///
    /// # Errors
    ///
    /// - [`SocialError::MissingTarget`] when the post does not exist
    /// - [`SocialError::NotFound`] when not liked (reject policy)
    pub fn unlike(
        &mut self,
        ctx: &RequestContext,
        post: PostId,
    ) -> Result<EdgeOutcome, SocialError> {
        let actor = require_authenticated(ctx)?;
        self.existing_post(post)?;

        match self.store.unlike(actor, post).map_err(store_err)? {
            Removal::Removed => {
                info!(user = %actor, post = %post, "like removed");
                Ok(EdgeOutcome::changed())
            }
            Removal::Absent => match self.options.duplicate_policy {
                DuplicatePolicy::Reject => Err(SocialError::NotFound(
                    "You have not liked this post.".to_string(),
                )),
                DuplicatePolicy::Ignore => {
                    debug!(user = %actor, post = %post, "unlike of absent edge ignored");
                    Ok(EdgeOutcome::unchanged())
                }
            },
        }
    }

    /// Whether `user` likes `post`
    pub fn is_liked(&self, user: UserId, post: PostId) -> Result<bool, SocialError> {
        self.store.is_liked(user, post).map_err(store_err)
    }

    // ----------------------------------------------------------------------
    // Accounts
    // ----------------------------------------------------------------------

    /// Register a new user
    ///
    /// Runs [`Self::prepare_registration`], hashes the password, then
    /// [`Self::create_account`]. Callers that must not hash while holding the
    /// service can run the three steps themselves.
    pub fn register(&mut self, registration: Registration) -> Result<User, SocialError> {
        let NewAccount { user, password } = self.prepare_registration(registration)?;
        let hash = hash_password(&password)?;
        self.create_account(user, &hash)
    }

    /// Validate a registration and build the user it would create
    pub fn prepare_registration(
        &self,
        registration: Registration,
    ) -> Result<NewAccount, SocialError> {
        let result = self
            .gatekeeper
            .validate_registration(&registration, Some(&self.store))
            .map_err(store_err)?;
        ensure_accepted(result)?;

        Ok(NewAccount {
            user: User {
                id: UserId::new(),
                username: registration.username,
                email: registration.email,
                bio: registration.bio,
                is_staff: false,
                created_at: now_millis(),
            },
            password: registration.password,
        })
    }

    /// Store a prepared user with its password hash
    pub fn create_account(&mut self, user: User, password_hash: &str) -> Result<User, SocialError> {
        match self.store.create_user(&user, password_hash).map_err(store_err)? {
            Insertion::Created => {
                info!(user = %user.id, username = %user.username, "user registered");
                Ok(user)
            }
            // Lost a race with a concurrent registration of the same name
            Insertion::AlreadyPresent => Err(SocialError::Invalid(vec![
                RejectionReason::UsernameTaken(user.username),
            ])),
        }
    }

    /// Check a username / password pair
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, SocialError> {
        check_login(username, password, self.credentials(username)?)
    }

    /// The user and stored password hash for `username`; finish with [`check_login`]
    pub fn credentials(&self, username: &str) -> Result<Option<(User, String)>, SocialError> {
        self.store.credentials(username).map_err(store_err)
    }

    /// Request context for an authenticated user id
    ///
    /// The staff flag is read from the store, so a revoked grant takes effect
    /// on the next request. An id with no user behind it is unauthenticated.
    pub fn context_for(&self, id: UserId) -> Result<RequestContext, SocialError> {
        match self.store.get_user(id).map_err(store_err)? {
            Some(user) if user.is_staff => Ok(RequestContext::staff(user.id)),
            Some(user) => Ok(RequestContext::user(user.id)),
            None => Err(SocialError::Unauthenticated),
        }
    }

    /// The actor's own profile
    pub fn profile(&self, ctx: &RequestContext) -> Result<Profile, SocialError> {
        let actor = require_authenticated(ctx)?;
        self.user_profile(actor)
    }

    /// Update the actor's own profile
    pub fn update_profile(
        &mut self,
        ctx: &RequestContext,
        update: ProfileUpdate,
    ) -> Result<Profile, SocialError> {
        let actor = require_authenticated(ctx)?;
        ensure_accepted(self.gatekeeper.validate_profile_update(&update))?;

        let user = self
            .store
            .update_profile(actor, &update)
            .map_err(store_err)?
            .ok_or_else(|| SocialError::MissingTarget(format!("User {} not found.", actor)))?;
        let counts = self.store.follow_counts(actor).map_err(store_err)?;
        Ok(Profile { user, counts })
    }

    /// Any user's public profile
    pub fn user_profile(&self, id: UserId) -> Result<Profile, SocialError> {
        let user = self.existing_user(id)?;
        let counts = self.store.follow_counts(id).map_err(store_err)?;
        Ok(Profile { user, counts })
    }

    /// All users, by username
    pub fn list_users(&self, page: PageRequest) -> Result<Page<User>, SocialError> {
        self.store.list_users(page).map_err(store_err)
    }

    // ----------------------------------------------------------------------
    // Posts, comments, feed, notifications
    // ----------------------------------------------------------------------

    /// Publish a post as the actor
    pub fn create_post(
        &mut self,
        ctx: &RequestContext,
        draft: PostDraft,
    ) -> Result<Post, SocialError> {
        let actor = require_authenticated(ctx)?;
        ensure_accepted(self.gatekeeper.validate_post(&draft))?;

        let now = now_millis();
        let post = Post {
            id: PostId::new(),
            author: actor,
            title: draft.title,
            content: draft.content,
            created_at: now,
            updated_at: now,
        };
        self.store.create_post(&post).map_err(store_err)?;
        info!(post = %post.id, author = %actor, "post created");
        Ok(post)
    }

    /// A single post with its like count
    pub fn post_details(&self, id: PostId) -> Result<PostDetails, SocialError> {
        let post = self.existing_post(id)?;
        let likes = self.store.like_count(id).map_err(store_err)?;
        Ok(PostDetails { post, likes })
    }

    /// Posts matching `query`, newest first
    pub fn list_posts(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<Post>, SocialError> {
        self.store.list_posts(query, page).map_err(store_err)
    }

    /// Edit a post (author or staff)
    pub fn update_post(
        &mut self,
        ctx: &RequestContext,
        id: PostId,
        update: PostUpdate,
    ) -> Result<Post, SocialError> {
        require_authenticated(ctx)?;
        let post = self.existing_post(id)?;
        owner_or_staff(ctx, post.author, "post")?;
        ensure_accepted(self.gatekeeper.validate_post_update(&update))?;

        self.store
            .update_post(id, &update, now_millis())
            .map_err(store_err)?
            .ok_or_else(|| SocialError::MissingTarget(format!("Post {} not found.", id)))
    }

    /// Delete a post with its likes and comments (author or staff)
    pub fn delete_post(&mut self, ctx: &RequestContext, id: PostId) -> Result<(), SocialError> {
        require_authenticated(ctx)?;
        let post = self.existing_post(id)?;
        let actor = owner_or_staff(ctx, post.author, "post")?;

        if !self.store.delete_post(id).map_err(store_err)? {
            return Err(SocialError::MissingTarget(format!("Post {} not found.", id)));
        }
        info!(post = %id, by = %actor, "post deleted");
        Ok(())
    }

    /// Comments on a post, oldest first
    pub fn list_comments(
        &self,
        post: PostId,
        page: PageRequest,
    ) -> Result<Page<Comment>, SocialError> {
        self.existing_post(post)?;
        self.store.list_comments(post, page).map_err(store_err)
    }

    /// Comment on a post as the actor
    pub fn create_comment(
        &mut self,
        ctx: &RequestContext,
        post: PostId,
        draft: CommentDraft,
    ) -> Result<Comment, SocialError> {
        let actor = require_authenticated(ctx)?;
        self.existing_post(post)?;
        ensure_accepted(self.gatekeeper.validate_comment(&draft))?;

        let now = now_millis();
        let comment = Comment {
            id: CommentId::new(),
            post,
            author: actor,
            content: draft.content,
            created_at: now,
            updated_at: now,
        };
        self.store.create_comment(&comment).map_err(store_err)?;
        Ok(comment)
    }

    /// A single comment
    pub fn comment(&self, id: CommentId) -> Result<Comment, SocialError> {
        self.existing_comment(id)
    }

    /// Edit a comment (author or staff)
    pub fn update_comment(
        &mut self,
        ctx: &RequestContext,
        id: CommentId,
        update: CommentUpdate,
    ) -> Result<Comment, SocialError> {
        require_authenticated(ctx)?;
        let comment = self.existing_comment(id)?;
        owner_or_staff(ctx, comment.author, "comment")?;
        ensure_accepted(self.gatekeeper.validate_comment_update(&update))?;

        self.store
            .update_comment(id, &update, now_millis())
            .map_err(store_err)?
            .ok_or_else(|| SocialError::MissingTarget(format!("Comment {} not found.", id)))
    }

    /// Delete a comment (author or staff)
    pub fn delete_comment(
        &mut self,
        ctx: &RequestContext,
        id: CommentId,
    ) -> Result<(), SocialError> {
        require_authenticated(ctx)?;
        let comment = self.existing_comment(id)?;
        let actor = owner_or_staff(ctx, comment.author, "comment")?;

        if !self.store.delete_comment(id).map_err(store_err)? {
            return Err(SocialError::MissingTarget(format!("Comment {} not found.", id)));
        }
        debug!(comment = %id, by = %actor, "comment deleted");
        Ok(())
    }

    /// Posts by users the actor follows, newest first
    pub fn feed(&self, ctx: &RequestContext, page: PageRequest) -> Result<Page<Post>, SocialError> {
        let actor = require_authenticated(ctx)?;
        self.store.feed(actor, page).map_err(store_err)
    }

    /// The actor's notifications, newest first
    pub fn notifications(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> Result<Page<Notification>, SocialError> {
        let actor = require_authenticated(ctx)?;
        self.store.notifications_for(actor, page).map_err(store_err)
    }

    // ----------------------------------------------------------------------
    // Lookups
    // ----------------------------------------------------------------------

    fn existing_user(&self, id: UserId) -> Result<User, SocialError> {
        self.store
            .get_user(id)
            .map_err(store_err)?
            .ok_or_else(|| SocialError::MissingTarget(format!("User {} not found.", id)))
    }

    fn existing_post(&self, id: PostId) -> Result<Post, SocialError> {
        self.store
            .get_post(id)
            .map_err(store_err)?
            .ok_or_else(|| SocialError::MissingTarget(format!("Post {} not found.", id)))
    }

    fn existing_comment(&self, id: CommentId) -> Result<Comment, SocialError> {
        self.store
            .get_comment(id)
            .map_err(store_err)?
            .ok_or_else(|| SocialError::MissingTarget(format!("Comment {} not found.", id)))
    }
}

fn owner_or_staff(
    ctx: &RequestContext,
    owner: UserId,
    resource: &'static str,
) -> Result<UserId, SocialError> {
    require_owner_or_staff(ctx, owner, resource).map_err(|denied| {
        warn!(actor = ?ctx.actor, owner = %owner, resource, "capability denied");
        SocialError::from(denied)
    })
}

fn ensure_accepted(result: ValidationResult) -> Result<(), SocialError> {
    if result.is_accepted() {
        Ok(())
    } else {
        Err(SocialError::Invalid(result.reasons))
    }
}
