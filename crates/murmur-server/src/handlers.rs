//! HTTP request handlers.
//!
//! Each handler resolves its path and query parameters, takes the service
//! lock for one service call, and renders the result as JSON. Password hashing
//! and verification run on the blocking pool with the lock released.

use crate::auth::auth_middleware;
use crate::config::ServerConfig;
use crate::dto::{
    AuthResponse, CommentRequest, CommentResponse, CommentUpdateRequest, DetailResponse, ErrorResponse, HealthResponse,
    LoginRequest, NotificationResponse, PageParams, PageResponse, PostListParams, PostRequest,
    PostResponse, PostUpdateRequest, ProfileResponse, ProfileUpdateRequest, RegisterRequest,
    UserResponse,
};
use crate::session::{SessionError, SessionManager};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router as AxumRouter,
};
use murmur_domain::{
    CommentDraft, CommentId, CommentUpdate, InvalidId, PostDraft, PostId, PostQuery, PostUpdate, ProfileUpdate,
    Registration, RequestContext, UserId,
};
use murmur_gatekeeper::Gatekeeper;
use murmur_social::{check_login, hash_password, NewAccount, SocialError, SocialService};
use murmur_store::{SqliteStore, StoreError};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The social service over the server's SQLite connection
    pub service: Arc<Mutex<SocialService<SqliteStore>>>,
    /// Session manager for JWT token operations
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Open the configured database and assemble the state
    pub fn open(config: &ServerConfig) -> Result<Self, StoreError> {
        let store = SqliteStore::new(&config.database_path)?;
        let service = SocialService::new(
            store,
            Gatekeeper::new(config.validation.clone()),
            config.service_options(),
        );

        Ok(Self {
            service: Arc::new(Mutex::new(service)),
            sessions: Arc::new(SessionManager::new(
                &config.jwt_secret,
                config.token_expiry_secs,
            )),
        })
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Service-level failure
    Social(SocialError),
    /// Token problem
    Session(SessionError),
    /// Malformed path or query parameter
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut reasons = Vec::new();
        let (status, message) = match self {
            AppError::Social(e) => match e {
                SocialError::SelfReference(_)
                | SocialError::AlreadyExists(_)
                | SocialError::NotFound(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                SocialError::Invalid(ref rs) => {
                    reasons = rs.iter().map(|r| r.to_string()).collect();
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                SocialError::MissingTarget(_) => (StatusCode::NOT_FOUND, e.to_string()),
                SocialError::Unauthenticated | SocialError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, e.to_string())
                }
                SocialError::Forbidden(_) => (StatusCode::FORBIDDEN, e.to_string()),
                SocialError::Store(_) | SocialError::Internal(_) => {
                    error!(error = %e, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            AppError::Session(e @ SessionError::JwtEncode(_)) => {
                error!(error = %e, "token issue failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Session(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse {
            error: message,
            reasons,
        });
        (status, body).into_response()
    }
}

impl From<SocialError> for AppError {
    fn from(e: SocialError) -> Self {
        AppError::Social(e)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

fn parse_id<T: FromStr<Err = InvalidId>>(raw: &str) -> Result<T, AppError> {
    raw.parse().map_err(|e: InvalidId| AppError::BadRequest(e.to_string()))
}

/// Run CPU-bound work on the blocking pool
async fn off_runtime<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        AppError::Social(SocialError::Internal(format!(
            "Blocking task failed: {}",
            e
        )))
    })
}

// --------------------------------------------------------------------------
// Accounts
// --------------------------------------------------------------------------

/// POST /accounts/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let NewAccount { user, password } =
        state.service.lock().await.prepare_registration(Registration {
            username: request.username,
            email: request.email,
            password: request.password,
            bio: request.bio,
        })?;
    let hash = off_runtime(move || hash_password(&password)).await??;
    let user = state.service.lock().await.create_account(user, &hash)?;
    let token = state.sessions.generate_token(user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /accounts/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let credentials = state.service.lock().await.credentials(&request.username)?;
    let LoginRequest { username, password } = request;
    let user = off_runtime(move || check_login(&username, &password, credentials)).await??;
    let token = state.sessions.generate_token(user.id)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// GET /accounts/profile
async fn get_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.service.lock().await.profile(&ctx)?;
    Ok(Json(profile.into()))
}

/// PATCH /accounts/profile
async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let update = ProfileUpdate {
        email: request.email,
        bio: request.bio,
    };
    let profile = state.service.lock().await.update_profile(&ctx, update)?;
    Ok(Json(profile.into()))
}

/// GET /accounts/users
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserResponse>>, AppError> {
    let service = state.service.lock().await;
    let page = service.page_request(params.page, params.page_size);
    Ok(Json(PageResponse::from_page(service.list_users(page)?)))
}

/// GET /accounts/users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let id: UserId = parse_id(&id)?;
    let profile = state.service.lock().await.user_profile(id)?;
    Ok(Json(profile.into()))
}

/// GET /accounts/users/:id/followers
async fn followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserResponse>>, AppError> {
    let id: UserId = parse_id(&id)?;
    let service = state.service.lock().await;
    let page = service.page_request(params.page, params.page_size);
    Ok(Json(PageResponse::from_page(service.followers(id, page)?)))
}

/// GET /accounts/users/:id/following
async fn following(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserResponse>>, AppError> {
    let id: UserId = parse_id(&id)?;
    let service = state.service.lock().await;
    let page = service.page_request(params.page, params.page_size);
    Ok(Json(PageResponse::from_page(service.following(id, page)?)))
}

/// POST /accounts/follow/:id
async fn follow(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    let target: UserId = parse_id(&id)?;
    let mut service = state.service.lock().await;
    let outcome = service.follow(&ctx, target)?;
    let username = service.user_profile(target)?.user.username;

    let detail = if outcome.changed {
        format!("Successfully followed {}.", username)
    } else {
        format!("Already following {}.", username)
    };
    Ok(Json(DetailResponse {
        detail,
        changed: outcome.changed,
    }))
}

/// POST /accounts/unfollow/:id
async fn unfollow(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    let target: UserId = parse_id(&id)?;
    let mut service = state.service.lock().await;
    let outcome = service.unfollow(&ctx, target)?;
    let username = service.user_profile(target)?.user.username;

    let detail = if outcome.changed {
        format!("Successfully unfollowed {}.", username)
    } else {
        format!("Not following {}.", username)
    };
    Ok(Json(DetailResponse {
        detail,
        changed: outcome.changed,
    }))
}

// --------------------------------------------------------------------------
// Posts and comments
// --------------------------------------------------------------------------

/// GET /posts
async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> Result<Json<PageResponse<PostResponse>>, AppError> {
    let author = params
        .author
        .as_deref()
        .map(parse_id::<UserId>)
        .transpose()?;
    let query = PostQuery {
        search: params.search,
        author,
    };

    let service = state.service.lock().await;
    let page = service.page_request(params.page, params.page_size);
    Ok(Json(PageResponse::from_page(service.list_posts(&query, page)?)))
}

/// POST /posts
async fn create_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let draft = PostDraft {
        title: request.title,
        content: request.content,
    };
    let post = state.service.lock().await.create_post(&ctx, draft)?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

/// GET /posts/:id
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let id: PostId = parse_id(&id)?;
    let details = state.service.lock().await.post_details(id)?;

    let mut response = PostResponse::from(details.post);
    response.likes = Some(details.likes);
    Ok(Json(response))
}

/// PATCH /posts/:id
async fn update_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(request): Json<PostUpdateRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let id: PostId = parse_id(&id)?;
    let update = PostUpdate {
        title: request.title,
        content: request.content,
    };
    let post = state.service.lock().await.update_post(&ctx, id, update)?;
    Ok(Json(post.into()))
}

/// DELETE /posts/:id
async fn delete_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: PostId = parse_id(&id)?;
    state.service.lock().await.delete_post(&ctx, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/:id/like
async fn like(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    let id: PostId = parse_id(&id)?;
    let outcome = state.service.lock().await.like(&ctx, id)?;

    let detail = if outcome.changed {
        "Post liked successfully!"
    } else {
        "Post already liked."
    };
    Ok(Json(DetailResponse {
        detail: detail.to_string(),
        changed: outcome.changed,
    }))
}

/// POST /posts/:id/unlike
async fn unlike(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    let id: PostId = parse_id(&id)?;
    let outcome = state.service.lock().await.unlike(&ctx, id)?;

    let detail = if outcome.changed {
        "Post unliked successfully!"
    } else {
        "Post was not liked."
    };
    Ok(Json(DetailResponse {
        detail: detail.to_string(),
        changed: outcome.changed,
    }))
}

/// GET /posts/:id/comments
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<CommentResponse>>, AppError> {
    let id: PostId = parse_id(&id)?;
    let service = state.service.lock().await;
    let page = service.page_request(params.page, params.page_size);
    Ok(Json(PageResponse::from_page(service.list_comments(id, page)?)))
}

/// POST /posts/:id/comments
async fn create_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let id: PostId = parse_id(&id)?;
    let draft = CommentDraft {
        content: request.content,
    };
    let comment = state.service.lock().await.create_comment(&ctx, id, draft)?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// GET /comments/:id
async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentResponse>, AppError> {
    let id: CommentId = parse_id(&id)?;
    let comment = state.service.lock().await.comment(id)?;
    Ok(Json(comment.into()))
}

/// PATCH /comments/:id
async fn update_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(request): Json<CommentUpdateRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let id: CommentId = parse_id(&id)?;
    let update = CommentUpdate {
        content: request.content,
    };
    let comment = state.service.lock().await.update_comment(&ctx, id, update)?;
    Ok(Json(comment.into()))
}

/// DELETE /comments/:id
async fn delete_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CommentId = parse_id(&id)?;
    state.service.lock().await.delete_comment(&ctx, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --------------------------------------------------------------------------
// Feed and notifications
// --------------------------------------------------------------------------

/// GET /feed
async fn feed(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<PostResponse>>, AppError> {
    let service = state.service.lock().await;
    let page = service.page_request(params.page, params.page_size);
    Ok(Json(PageResponse::from_page(service.feed(&ctx, page)?)))
}

/// GET /notifications
async fn notifications(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<NotificationResponse>>, AppError> {
    let service = state.service.lock().await;
    let page = service.page_request(params.page, params.page_size);
    Ok(Json(PageResponse::from_page(
        service.notifications(&ctx, page)?,
    )))
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/accounts/register", post(register))
        .route("/accounts/login", post(login))
        .route("/accounts/profile", get(get_profile).patch(update_profile))
        .route("/accounts/users", get(list_users))
        .route("/accounts/users/:id", get(get_user))
        .route("/accounts/users/:id/followers", get(followers))
        .route("/accounts/users/:id/following", get(following))
        .route("/accounts/follow/:id", post(follow))
        .route("/accounts/unfollow/:id", post(unfollow))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/posts/:id/like", post(like))
        .route("/posts/:id/unlike", post(unlike))
        .route(
            "/posts/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/comments/:id",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
        .route("/feed", get(feed))
        .route("/notifications", get(notifications))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState {
        AppState::open(&ServerConfig::default_test_config()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/accounts/register")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"username": "alice", "email": "alice@example.com", "password": "password123"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_blocking_work_leaves_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let worker = off_runtime(|| std::thread::current().id()).await.unwrap();
        assert_ne!(worker, runtime_thread);
    }

    #[tokio::test]
    async fn test_blocking_panic_is_internal_error() {
        let err = off_runtime(|| -> u8 { panic!("hash exploded") })
            .await
            .unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_malformed_id() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/posts/not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (SocialError::SelfReference("x".into()), StatusCode::BAD_REQUEST),
            (SocialError::AlreadyExists("x".into()), StatusCode::BAD_REQUEST),
            (SocialError::NotFound("x".into()), StatusCode::BAD_REQUEST),
            (SocialError::MissingTarget("x".into()), StatusCode::NOT_FOUND),
            (SocialError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (SocialError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (SocialError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                SocialError::Store("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
        assert_eq!(
            AppError::from(SessionError::TokenExpired)
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
