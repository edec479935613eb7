//! Integration tests for murmur-social
//!
//! Drive the service end to end against SQLite: edge semantics, the like
//! notification, duplicate policy, ownership checks and the feed.

use murmur_domain::{
    CommentDraft, CommentUpdate, DuplicatePolicy, PostDraft, PostId, PostQuery, PostUpdate, ProfileUpdate,
    Registration, RequestContext, User, UserId, LIKED_YOUR_POST,
};
use murmur_gatekeeper::{Gatekeeper, RejectionReason, ValidationConfig};
use murmur_social::{check_login, hash_password, ServiceOptions, SocialError, SocialService};
use murmur_store::SqliteStore;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

fn service_with(policy: DuplicatePolicy) -> SocialService<SqliteStore> {
    let store = SqliteStore::new(":memory:").unwrap();
    SocialService::new(
        store,
        Gatekeeper::new(ValidationConfig::permissive()),
        ServiceOptions {
            duplicate_policy: policy,
            ..ServiceOptions::default()
        },
    )
}

fn service() -> SocialService<SqliteStore> {
    service_with(DuplicatePolicy::Reject)
}

fn file_service(path: &Path) -> SocialService<SqliteStore> {
    SocialService::new(
        SqliteStore::new(path).unwrap(),
        Gatekeeper::new(ValidationConfig::permissive()),
        ServiceOptions::default(),
    )
}

fn register(service: &mut SocialService<SqliteStore>, username: &str) -> User {
    service
        .register(Registration {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "password123".to_string(),
            bio: String::new(),
        })
        .unwrap()
}

fn publish(service: &mut SocialService<SqliteStore>, author: UserId, title: &str) -> PostId {
    service
        .create_post(
            &RequestContext::user(author),
            PostDraft {
                title: title.to_string(),
                content: format!("{} body", title),
            },
        )
        .unwrap()
        .id
}

#[test]
fn test_follow_then_duplicate_is_rejected() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let ctx = RequestContext::user(alice.id);

    let outcome = service.follow(&ctx, bob.id).unwrap();
    assert!(outcome.changed);
    assert!(service.is_following(alice.id, bob.id).unwrap());

    let err = service.follow(&ctx, bob.id).unwrap_err();
    assert!(matches!(err, SocialError::AlreadyExists(_)));

    let followers = service
        .followers(bob.id, service.page_request(None, None))
        .unwrap();
    assert_eq!(followers.total, 1);
}

#[test]
fn test_self_follow_is_rejected() {
    let mut service = service();
    let alice = register(&mut service, "alice");

    let err = service
        .follow(&RequestContext::user(alice.id), alice.id)
        .unwrap_err();
    assert!(matches!(err, SocialError::SelfReference(_)));
    assert!(!service.is_following(alice.id, alice.id).unwrap());
}

#[test]
fn test_follow_missing_user() {
    let mut service = service();
    let alice = register(&mut service, "alice");

    let err = service
        .follow(&RequestContext::user(alice.id), UserId::new())
        .unwrap_err();
    assert!(matches!(err, SocialError::MissingTarget(_)));
}

#[test]
fn test_unfollow_absent_edge() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let ctx = RequestContext::user(alice.id);

    let err = service.unfollow(&ctx, bob.id).unwrap_err();
    assert!(matches!(err, SocialError::NotFound(_)));

    service.follow(&ctx, bob.id).unwrap();
    assert!(service.unfollow(&ctx, bob.id).unwrap().changed);
    assert!(!service.is_following(alice.id, bob.id).unwrap());

    // Follow is available again after an unfollow
    assert!(service.follow(&ctx, bob.id).unwrap().changed);
}

#[test]
fn test_ignore_policy_turns_duplicates_into_noops() {
    let mut service = service_with(DuplicatePolicy::Ignore);
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let post = publish(&mut service, bob.id, "hello");
    let ctx = RequestContext::user(alice.id);

    assert!(service.follow(&ctx, bob.id).unwrap().changed);
    assert!(!service.follow(&ctx, bob.id).unwrap().changed);
    assert!(service.unfollow(&ctx, bob.id).unwrap().changed);
    assert!(!service.unfollow(&ctx, bob.id).unwrap().changed);

    assert!(service.like(&ctx, post).unwrap().changed);
    let again = service.like(&ctx, post).unwrap();
    assert!(!again.changed);
    assert!(again.notification.is_none());
    assert!(service.unlike(&ctx, post).unwrap().changed);
    assert!(!service.unlike(&ctx, post).unwrap().changed);

    // Self-follow is an error under either policy
    assert!(matches!(
        service.follow(&ctx, alice.id),
        Err(SocialError::SelfReference(_))
    ));
}

#[test]
fn test_like_notifies_author_once() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let post = publish(&mut service, bob.id, "hello");
    let ctx = RequestContext::user(alice.id);

    let outcome = service.like(&ctx, post).unwrap();
    let notification = outcome.notification.expect("author should be notified");
    assert_eq!(notification.recipient, bob.id);
    assert_eq!(notification.actor, alice.id);
    assert_eq!(notification.verb, LIKED_YOUR_POST);
    assert_eq!(notification.target, Some(post));

    assert!(matches!(
        service.like(&ctx, post),
        Err(SocialError::AlreadyExists(_))
    ));

    let inbox = service
        .notifications(&RequestContext::user(bob.id), service.page_request(None, None))
        .unwrap();
    assert_eq!(inbox.total, 1);
    assert_eq!(service.post_details(post).unwrap().likes, 1);
}

#[test]
fn test_self_like_does_not_notify() {
    let mut service = service();
    let bob = register(&mut service, "bob");
    let post = publish(&mut service, bob.id, "mine");

    let outcome = service.like(&RequestContext::user(bob.id), post).unwrap();
    assert!(outcome.changed);
    assert!(outcome.notification.is_none());
    assert_eq!(service.store().notification_count().unwrap(), 0);
}

#[test]
fn test_unlike_keeps_notification() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let post = publish(&mut service, bob.id, "hello");
    let ctx = RequestContext::user(alice.id);

    service.like(&ctx, post).unwrap();
    service.unlike(&ctx, post).unwrap();
    assert!(!service.is_liked(alice.id, post).unwrap());
    assert!(matches!(
        service.unlike(&ctx, post),
        Err(SocialError::NotFound(_))
    ));

    // A fresh like after unlike notifies again
    assert!(service.like(&ctx, post).unwrap().notification.is_some());
    assert_eq!(service.store().notification_count().unwrap(), 2);
}

#[test]
fn test_like_missing_post() {
    let mut service = service();
    let alice = register(&mut service, "alice");

    let err = service
        .like(&RequestContext::user(alice.id), PostId::new())
        .unwrap_err();
    assert!(matches!(err, SocialError::MissingTarget(_)));
    assert!(err.is_not_found());
}

#[test]
fn test_anonymous_actor_is_unauthenticated() {
    let mut service = service();
    let bob = register(&mut service, "bob");
    let post = publish(&mut service, bob.id, "hello");
    let anon = RequestContext::anonymous();

    assert!(matches!(
        service.follow(&anon, bob.id),
        Err(SocialError::Unauthenticated)
    ));
    assert!(matches!(
        service.like(&anon, post),
        Err(SocialError::Unauthenticated)
    ));
    assert!(matches!(
        service.feed(&anon, service.page_request(None, None)),
        Err(SocialError::Unauthenticated)
    ));
}

#[test]
fn test_registration_rules() {
    let mut service = service();
    register(&mut service, "alice");

    let err = service
        .register(Registration {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password: "password123".to_string(),
            bio: String::new(),
        })
        .unwrap_err();
    match err {
        SocialError::Invalid(reasons) => assert!(reasons
            .iter()
            .any(|r| matches!(r, RejectionReason::UsernameTaken(_)))),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_authenticate() {
    let mut service = service();
    let alice = register(&mut service, "alice");

    assert_eq!(
        service.authenticate("alice", "password123").unwrap().id,
        alice.id
    );
    assert!(matches!(
        service.authenticate("alice", "nope"),
        Err(SocialError::InvalidCredentials)
    ));
    assert!(matches!(
        service.authenticate("nobody", "password123"),
        Err(SocialError::InvalidCredentials)
    ));
}

#[test]
fn test_registration_in_steps() {
    let mut service = service();
    let registration = |name: &str| Registration {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        password: "password123".to_string(),
        bio: String::new(),
    };

    // Two sign-ups for the same name both pass validation before either is stored
    let first = service.prepare_registration(registration("alice")).unwrap();
    let second = service.prepare_registration(registration("alice")).unwrap();

    let hash = hash_password(&first.password).unwrap();
    let alice = service.create_account(first.user, &hash).unwrap();

    let hash = hash_password(&second.password).unwrap();
    let err = service.create_account(second.user, &hash).unwrap_err();
    match err {
        SocialError::Invalid(reasons) => {
            assert_eq!(reasons, vec![RejectionReason::UsernameTaken("alice".to_string())])
        }
        other => panic!("expected Invalid, got {:?}", other),
    }

    let credentials = service.credentials("alice").unwrap();
    assert_eq!(
        check_login("alice", "password123", credentials).unwrap().id,
        alice.id
    );
    assert!(service.credentials("nobody").unwrap().is_none());
}

#[test]
fn test_profile_and_counts() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let ctx = RequestContext::user(alice.id);
    service.follow(&ctx, bob.id).unwrap();

    let profile = service
        .update_profile(
            &ctx,
            ProfileUpdate {
                email: None,
                bio: Some("hi there".to_string()),
            },
        )
        .unwrap();
    assert_eq!(profile.user.bio, "hi there");
    assert_eq!(profile.counts.following, 1);
    assert_eq!(profile.counts.followers, 0);

    let bob_profile = service.user_profile(bob.id).unwrap();
    assert_eq!(bob_profile.counts.followers, 1);

    assert!(matches!(
        service.update_profile(&ctx, ProfileUpdate::default()),
        Err(SocialError::Invalid(_))
    ));
}

#[test]
fn test_context_for_reads_staff_flag() {
    let mut service = service();
    let alice = register(&mut service, "alice");

    assert_eq!(
        service.context_for(alice.id).unwrap(),
        RequestContext::user(alice.id)
    );
    service.store_mut().set_staff(alice.id, true).unwrap();
    assert_eq!(
        service.context_for(alice.id).unwrap(),
        RequestContext::staff(alice.id)
    );
    assert!(matches!(
        service.context_for(UserId::new()),
        Err(SocialError::Unauthenticated)
    ));
}

#[test]
fn test_post_ownership() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let moderator = register(&mut service, "moderator");
    service.store_mut().set_staff(moderator.id, true).unwrap();
    let post = publish(&mut service, bob.id, "original");

    let update = PostUpdate {
        title: Some("edited".to_string()),
        content: None,
    };
    assert!(matches!(
        service.update_post(&RequestContext::user(alice.id), post, update.clone()),
        Err(SocialError::Forbidden(_))
    ));

    let edited = service
        .update_post(&RequestContext::user(bob.id), post, update)
        .unwrap();
    assert_eq!(edited.title, "edited");
    assert_eq!(edited.content, "original body");

    assert!(matches!(
        service.delete_post(&RequestContext::user(alice.id), post),
        Err(SocialError::Forbidden(_))
    ));
    service
        .delete_post(&RequestContext::staff(moderator.id), post)
        .unwrap();
    assert!(matches!(
        service.post_details(post),
        Err(SocialError::MissingTarget(_))
    ));
}

#[test]
fn test_comments() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let post = publish(&mut service, bob.id, "hello");

    let comment = service
        .create_comment(
            &RequestContext::user(alice.id),
            post,
            CommentDraft {
                content: "nice".to_string(),
            },
        )
        .unwrap();
    let page = service
        .list_comments(post, service.page_request(None, None))
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].author, alice.id);

    assert_eq!(service.comment(comment.id).unwrap(), comment);

    let edit = |text: &str| CommentUpdate {
        content: Some(text.to_string()),
    };
    assert!(matches!(
        service.update_comment(&RequestContext::user(bob.id), comment.id, edit("mine now")),
        Err(SocialError::Forbidden(_))
    ));
    assert!(matches!(
        service.update_comment(
            &RequestContext::user(alice.id),
            comment.id,
            CommentUpdate::default()
        ),
        Err(SocialError::Invalid(_))
    ));
    let edited = service
        .update_comment(&RequestContext::user(alice.id), comment.id, edit("very nice"))
        .unwrap();
    assert_eq!(edited.content, "very nice");
    assert_eq!(edited.created_at, comment.created_at);
    assert_eq!(service.comment(comment.id).unwrap().content, "very nice");

    assert!(matches!(
        service.delete_comment(&RequestContext::user(bob.id), comment.id),
        Err(SocialError::Forbidden(_))
    ));
    service
        .delete_comment(&RequestContext::user(alice.id), comment.id)
        .unwrap();
    assert_eq!(
        service
            .list_comments(post, service.page_request(None, None))
            .unwrap()
            .total,
        0
    );
    assert!(matches!(
        service.comment(comment.id),
        Err(SocialError::MissingTarget(_))
    ));
    assert!(matches!(
        service.update_comment(&RequestContext::user(alice.id), comment.id, edit("again")),
        Err(SocialError::MissingTarget(_))
    ));
}

#[test]
fn test_staff_may_edit_any_comment() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let admin = register(&mut service, "admin");
    let post = publish(&mut service, alice.id, "hello");
    let comment = service
        .create_comment(
            &RequestContext::user(alice.id),
            post,
            CommentDraft {
                content: "rude".to_string(),
            },
        )
        .unwrap();

    let edited = service
        .update_comment(
            &RequestContext::staff(admin.id),
            comment.id,
            CommentUpdate {
                content: Some("[removed]".to_string()),
            },
        )
        .unwrap();
    assert_eq!(edited.author, alice.id);
    assert_eq!(edited.content, "[removed]");
}

#[test]
fn test_comment_delete_that_removes_nothing_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("murmur.db");
    let mut service = file_service(&path);
    let alice = register(&mut service, "alice");
    let post = publish(&mut service, alice.id, "hello");
    let comment = service
        .create_comment(
            &RequestContext::user(alice.id),
            post,
            CommentDraft {
                content: "nice".to_string(),
            },
        )
        .unwrap();

    // The row is found but the DELETE affects nothing, as when another
    // connection removes it between the lookup and the write
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER skip_comment_delete BEFORE DELETE ON comments
         BEGIN SELECT RAISE(IGNORE); END;",
    )
    .unwrap();

    assert!(matches!(
        service.delete_comment(&RequestContext::user(alice.id), comment.id),
        Err(SocialError::MissingTarget(_))
    ));
}

#[test]
fn test_feed_and_search() {
    let mut service = service();
    let alice = register(&mut service, "alice");
    let bob = register(&mut service, "bob");
    let carol = register(&mut service, "carol");
    publish(&mut service, bob.id, "rust tips");
    publish(&mut service, carol.id, "gardening");
    let ctx = RequestContext::user(alice.id);

    service.follow(&ctx, bob.id).unwrap();
    let feed = service.feed(&ctx, service.page_request(None, None)).unwrap();
    assert_eq!(feed.total, 1);
    assert_eq!(feed.items[0].author, bob.id);

    let found = service
        .list_posts(
            &PostQuery {
                search: Some("garden".to_string()),
                author: None,
            },
            service.page_request(None, None),
        )
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].author, carol.id);
}

#[test]
fn test_page_request_is_clamped() {
    let service = service();
    let req = service.page_request(Some(0), Some(1_000));
    assert_eq!(req.page, 1);
    assert_eq!(req.page_size, 100);
    assert_eq!(service.page_request(None, None).page_size, 10);
}

#[test]
fn test_concurrent_double_like_through_two_services() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("murmur.db");

    let mut setup = file_service(&path);
    let alice = register(&mut setup, "alice");
    let bob = register(&mut setup, "bob");
    let post = publish(&mut setup, bob.id, "hello");

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            thread::spawn(move || {
                let mut service = file_service(&path);
                barrier.wait();
                service.like(&RequestContext::user(alice.id), post)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(SocialError::AlreadyExists(_))))
        .count();

    assert_eq!(created, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(setup.store().like_edge_count().unwrap(), 1);
    assert_eq!(setup.store().notification_count().unwrap(), 1);
}
