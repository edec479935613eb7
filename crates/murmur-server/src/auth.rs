//! Bearer-token authentication middleware.
//!
//! Resolves `Authorization: Bearer <token>` into a [`RequestContext`] and
//! stores it in the request extensions. A request without the header runs as
//! anonymous; a malformed, expired or forged token is rejected with 401.

use crate::handlers::{AppError, AppState};
use crate::session::SessionError;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use murmur_domain::RequestContext;

/// Attach the caller's [`RequestContext`] to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let ctx = match token {
        None => RequestContext::anonymous(),
        Some(token) => {
            let claims = state.sessions.validate_token(&token)?;
            let user = claims.user_id()?;
            let service = state.service.lock().await;
            service.context_for(user)?
        }
    };

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// The bearer token, if an Authorization header is present
fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, SessionError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| Some(token.trim().to_string()))
        .ok_or(SessionError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_header_is_anonymous() {
        assert_eq!(bearer_token(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn test_bearer_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap().as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_other_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(matches!(bearer_token(&headers), Err(SessionError::InvalidToken)));
    }
}
