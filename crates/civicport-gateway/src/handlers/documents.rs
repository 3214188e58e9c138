//! Document handlers

use crate::error::ApiResult;
use crate::handlers::report_json;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use civicport_core::{DocumentRecord, DocumentStatus, Error};
use civicport_portal::documents::{DocumentSubmission, ReviewDecision};
use civicport_portal::Identity;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<DocumentRecord>>> {
    let status = match params.status.as_deref() {
        None => None,
        Some(s) => Some(
            DocumentStatus::parse(s)
                .ok_or_else(|| Error::invalid_input(format!("unknown status: {s}")))?,
        ),
    };
    Ok(Json(state.documents.list_for(&identity, status).await?))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<DocumentSubmission>,
) -> ApiResult<Json<DocumentRecord>> {
    Ok(Json(state.documents.submit(&identity, request).await?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<DocumentRecord>> {
    Ok(Json(state.documents.get(&identity, &id).await?))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn review(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let (document, report) = state
        .documents
        .review(&identity, &id, request.decision, request.note)
        .await?;
    Ok(Json(json!({
        "document": document,
        "notification": report_json(&report),
    })))
}
