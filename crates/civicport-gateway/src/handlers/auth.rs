//! Auth handlers — registration, login, session introspection

use crate::error::ApiResult;
use crate::guard::BearerToken;
use crate::state::AppState;
use axum::extract::State;
use axum::{Extension, Json};
use civicport_backend::resolve_profile;
use civicport_core::{Error, Profile};
use civicport_portal::Identity;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if !request.email.contains('@') {
        return Err(Error::invalid_input("a valid email is required").into());
    }
    if request.password.len() < 8 {
        return Err(Error::invalid_input("password must be at least 8 characters").into());
    }
    if request.full_name.trim().is_empty() {
        return Err(Error::invalid_input("full_name is required").into());
    }

    let user = state
        .backend
        .sign_up(
            &request.email,
            &request.password,
            request.full_name.trim(),
            request.phone.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "id": user.id, "email": user.email })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = state
        .backend
        .sign_in(&request.email, &request.password)
        .await?;
    let profile = resolve_profile(&state.backend, &session.user, state.profile_timeout()).await;
    Ok(Json(session_body(&session, profile)))
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let session = state.backend.refresh(&request.refresh_token).await?;
    let profile = resolve_profile(&state.backend, &session.user, state.profile_timeout()).await;
    Ok(Json(session_body(&session, profile)))
}

fn session_body(session: &civicport_backend::AuthSession, profile: Profile) -> serde_json::Value {
    json!({
        "access_token": session.access_token,
        "refresh_token": session.refresh_token,
        "expires_in": session.expires_in,
        "profile": profile,
    })
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<BearerToken>,
) -> ApiResult<Json<serde_json::Value>> {
    // dropping the cached entry is what locks the token out of the portal;
    // backend revocation is best effort
    state.sessions.invalidate(&token.0);
    if let Err(e) = state.backend.sign_out(&token.0).await {
        warn!("Backend sign-out failed: {e}");
    }
    Ok(Json(json!({ "ok": true })))
}

pub async fn me(Extension(identity): Extension<Identity>) -> Json<Profile> {
    Json(identity.profile)
}
