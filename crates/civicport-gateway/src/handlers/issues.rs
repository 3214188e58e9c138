//! Issue handlers

use crate::error::ApiResult;
use crate::handlers::report_json;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use civicport_core::{Error, Issue, IssueStatus, UserId};
use civicport_portal::issues::{IssueReport, CATEGORIES};
use civicport_portal::Identity;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub async fn categories() -> Json<serde_json::Value> {
    Json(json!({ "categories": CATEGORIES }))
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Issue>>> {
    let status = match params.status.as_deref() {
        None => None,
        Some(s) => Some(
            IssueStatus::parse(s)
                .ok_or_else(|| Error::invalid_input(format!("unknown status: {s}")))?,
        ),
    };
    Ok(Json(state.issues.list_for(&identity, status).await?))
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<IssueReport>,
) -> ApiResult<Json<Issue>> {
    Ok(Json(state.issues.report(&identity, request).await?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Issue>> {
    Ok(Json(state.issues.get(&identity, &id).await?))
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub assignee: String,
}

pub async fn assign(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<Issue>> {
    let assignee = UserId::new(request.assignee);
    Ok(Json(state.issues.assign(&identity, &id, &assignee).await?))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let to = IssueStatus::parse(&request.status)
        .ok_or_else(|| Error::invalid_input(format!("unknown status: {}", request.status)))?;
    let (issue, report) = state
        .issues
        .update_status(&identity, &id, to, request.note)
        .await?;
    Ok(Json(json!({
        "issue": issue,
        "notification": report_json(&report),
    })))
}
