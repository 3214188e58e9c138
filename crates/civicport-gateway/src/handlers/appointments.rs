//! Appointment handlers

use crate::error::ApiResult;
use crate::handlers::report_json;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use civicport_core::{Appointment, AppointmentStatus, Error};
use civicport_portal::appointments::{BookingRequest, SERVICES};
use civicport_portal::Identity;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Public service catalog, so the booking form never hardcodes it.
pub async fn services() -> Json<serde_json::Value> {
    let services: Vec<_> = SERVICES
        .iter()
        .map(|s| {
            json!({
                "code": s.code,
                "name": s.name,
                "slot_minutes": s.slot_minutes,
            })
        })
        .collect();
    Json(json!({ "services": services }))
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
    /// One day's schedule (YYYY-MM-DD), for the front-desk view.
    #[serde(default)]
    pub day: Option<NaiveDate>,
}

fn parse_status(raw: Option<&str>) -> ApiResult<Option<AppointmentStatus>> {
    match raw {
        None => Ok(None),
        Some(s) => AppointmentStatus::parse(s)
            .map(Some)
            .ok_or_else(|| Error::invalid_input(format!("unknown status: {s}")).into()),
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Appointment>>> {
    let status = parse_status(params.status.as_deref())?;
    Ok(Json(
        state
            .appointments
            .list_for(&identity, status, params.day)
            .await?,
    ))
}

pub async fn book(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<BookingRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let (appointment, report) = state.appointments.book(&identity, request).await?;
    Ok(Json(json!({
        "appointment": appointment,
        "notification": report_json(&report),
    })))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.appointments.get(&identity, &id).await?))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let (appointment, report) = state.appointments.cancel(&identity, &id).await?;
    Ok(Json(json!({
        "appointment": appointment,
        "notification": report_json(&report),
    })))
}

pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.appointments.confirm(&identity, &id).await?))
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.appointments.complete(&identity, &id).await?))
}

pub async fn no_show(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.appointments.mark_no_show(&identity, &id).await?))
}

pub async fn remind(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let report = state.appointments.remind(&identity, &id).await?;
    Ok(Json(json!({ "notification": report_json(&report) })))
}

pub async fn qr(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let data_url = state.appointments.qr_for(&identity, &id).await?;
    Ok(Json(json!({ "qr": data_url })))
}

#[derive(Deserialize)]
pub struct CheckInRequest {
    /// The decoded QR contents, verbatim.
    pub payload: String,
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CheckInRequest>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(
        state.appointments.check_in(&identity, &request.payload).await?,
    ))
}
