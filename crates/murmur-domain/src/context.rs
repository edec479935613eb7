//! Request context and capability checks
//!
//! Every service operation receives the acting identity explicitly and starts
//! by calling one of the predicates below. A failed check yields [`Denied`].

use std::fmt;

use crate::UserId;

/// Identity on whose behalf an operation runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Authenticated user, `None` for anonymous requests
    pub actor: Option<UserId>,

    /// Whether the actor has staff privileges
    pub is_staff: bool,
}

impl RequestContext {
    /// Context for an unauthenticated request
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for an authenticated, non-staff user
    pub fn user(id: UserId) -> Self {
        Self {
            actor: Some(id),
            is_staff: false,
        }
    }

    /// Context for an authenticated staff user
    pub fn staff(id: UserId) -> Self {
        Self {
            actor: Some(id),
            is_staff: true,
        }
    }
}

/// Typed authorization failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denied {
    /// The operation needs an authenticated actor
    Unauthenticated,

    /// The actor does not own the resource and is not staff
    NotOwner {
        /// Kind of resource, e.g. "post"
        resource: &'static str,
    },
}

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denied::Unauthenticated => write!(f, "Authentication credentials were not provided"),
            Denied::NotOwner { resource } => {
                write!(f, "You do not have permission to modify this {}", resource)
            }
        }
    }
}

impl std::error::Error for Denied {}

/// Require an authenticated actor and return its id
pub fn require_authenticated(ctx: &RequestContext) -> Result<UserId, Denied> {
    ctx.actor.ok_or(Denied::Unauthenticated)
}

/// Require the actor to own the resource, or to be staff
pub fn require_owner_or_staff(
    ctx: &RequestContext,
    owner: UserId,
    resource: &'static str,
) -> Result<UserId, Denied> {
    let actor = require_authenticated(ctx)?;
    if actor == owner || ctx.is_staff {
        Ok(actor)
    } else {
        Err(Denied::NotOwner { resource })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_rejected() {
        let ctx = RequestContext::anonymous();
        assert_eq!(require_authenticated(&ctx), Err(Denied::Unauthenticated));
        assert_eq!(
            require_owner_or_staff(&ctx, UserId::new(), "post"),
            Err(Denied::Unauthenticated)
        );
    }

    #[test]
    fn test_owner_passes() {
        let owner = UserId::new();
        let ctx = RequestContext::user(owner);
        assert_eq!(require_owner_or_staff(&ctx, owner, "post"), Ok(owner));
    }

    #[test]
    fn test_stranger_is_not_owner() {
        let ctx = RequestContext::user(UserId::new());
        let denied = require_owner_or_staff(&ctx, UserId::new(), "comment").unwrap_err();
        assert_eq!(denied, Denied::NotOwner { resource: "comment" });
        assert!(denied.to_string().contains("comment"));
    }

    #[test]
    fn test_staff_may_moderate() {
        let staff = UserId::new();
        let ctx = RequestContext::staff(staff);
        assert_eq!(require_owner_or_staff(&ctx, UserId::new(), "post"), Ok(staff));
    }
}
