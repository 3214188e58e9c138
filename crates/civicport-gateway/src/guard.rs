//! Bearer-token guard for protected routes
//!
//! Resolves the caller once per request and stores the identity in request
//! extensions. Role checks stay with the handlers, which consult the shared
//! access policy rather than comparing role strings.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use civicport_core::Error;
use std::sync::Arc;

/// Raw token carried alongside the identity so logout can invalidate it.
#[derive(Clone)]
pub struct BearerToken(pub String);

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| Error::auth_failed("missing bearer token"))?
        .to_string();

    let identity = state.sessions.authenticate(&state.backend, &token).await?;

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(BearerToken(token));
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
