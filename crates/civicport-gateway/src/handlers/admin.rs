//! Admin handlers — user management

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use civicport_backend::profiles::PROFILE_TABLE;
use civicport_core::{Error, Profile, Role};
use civicport_portal::{require, Identity, Permission};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<Profile>>> {
    require(identity.role(), Permission::ManageUsers)?;
    let profiles = state
        .backend
        .from(PROFILE_TABLE)
        .order("created_at", true)
        .fetch::<Profile>()
        .await?;
    Ok(Json(profiles))
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

pub async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(request): Json<RoleRequest>,
) -> ApiResult<Json<Profile>> {
    require(identity.role(), Permission::ManageUsers)?;
    let role = Role::parse(&request.role)
        .ok_or_else(|| Error::invalid_input(format!("unknown role: {}", request.role)))?;

    let mut rows: Vec<Profile> = state
        .backend
        .update(PROFILE_TABLE)
        .set(json!({ "role": role.as_str() }))?
        .eq("id", &id)
        .execute()
        .await?;
    if rows.is_empty() {
        return Err(Error::not_found("profile", &id).into());
    }
    let profile = rows.swap_remove(0);
    info!("Role of {} set to {role} by {}", profile.id, identity.user_id());
    Ok(Json(profile))
}
