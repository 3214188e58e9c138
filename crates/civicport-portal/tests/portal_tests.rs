//! Tests for civicport-portal: access policy enforcement at the service edge
//!
//! Guard checks run before any backend I/O, so an unreachable backend proves
//! the ordering: a denied caller is rejected without a single network call.

use chrono::{TimeZone, Utc};
use civicport_backend::BackendClient;
use civicport_core::{Error, Profile, Role, UserId};
use civicport_notify::Dispatcher;
use civicport_portal::appointments::{AppointmentService, BookingRequest};
use civicport_portal::documents::{DocumentService, DocumentSubmission, ReviewDecision};
use civicport_portal::issues::{IssueReport, IssueService};
use civicport_portal::Identity;
use std::sync::Arc;
use std::time::Duration;

fn identity(id: &str, role: Role) -> Identity {
    let user = serde_json::from_value(serde_json::json!({
        "id": id,
        "email": format!("{id}@example.gov"),
    }))
    .unwrap();
    let mut profile = Profile::fallback(UserId::new(id), format!("{id}@example.gov"), None);
    profile.role = role;
    Identity { user, profile }
}

fn backend() -> Arc<BackendClient> {
    // nothing listens here; tests must not get far enough to care
    Arc::new(BackendClient::new("http://127.0.0.1:9", "anon"))
}

fn dispatcher() -> Arc<Dispatcher> {
    Arc::new(Dispatcher::new(Duration::from_millis(100)))
}

fn appointment_service() -> AppointmentService {
    AppointmentService::new(backend(), dispatcher(), b"test-secret".to_vec(), 4)
}

// ===========================================================================
// Appointments
// ===========================================================================

#[tokio::test]
async fn booking_rejects_unknown_service_before_io() {
    let svc = appointment_service();
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .book(
            &citizen,
            BookingRequest {
                service: "haircuts".to_string(),
                scheduled_at: Utc.with_ymd_and_hms(2100, 1, 4, 10, 0, 0).unwrap(),
                location: "city-hall".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn booking_rejects_misaligned_slot() {
    let svc = appointment_service();
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .book(
            &citizen,
            BookingRequest {
                service: "permits".to_string(),
                scheduled_at: Utc.with_ymd_and_hms(2100, 1, 4, 10, 12, 0).unwrap(),
                location: "city-hall".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("half hour"));
}

#[tokio::test]
async fn booking_requires_location() {
    let svc = appointment_service();
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .book(
            &citizen,
            BookingRequest {
                service: "permits".to_string(),
                scheduled_at: Utc.with_ymd_and_hms(2100, 1, 4, 10, 0, 0).unwrap(),
                location: "   ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("location"));
}

#[tokio::test]
async fn citizens_cannot_check_in() {
    let svc = appointment_service();
    let citizen = identity("u-1", Role::Citizen);
    let err = svc.check_in(&citizen, "{}").await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
}

#[tokio::test]
async fn check_in_rejects_tampered_payload() {
    let svc = appointment_service();
    let officer = identity("o-1", Role::Officer);
    // well-formed payload signed with a different secret
    let forged = serde_json::json!({
        "appointment_id": "apt-1",
        "citizen_id": "u-1",
        "service": "permits",
        "scheduled_at": "2026-09-14T10:30:00Z",
        "location": "city-hall",
        "signature": "Zm9yZ2Vk",
    });
    let err = svc
        .check_in(&officer, &forged.to_string())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("signature"));
}

#[tokio::test]
async fn check_in_rejects_malformed_payload() {
    let svc = appointment_service();
    let officer = identity("o-1", Role::Officer);
    let err = svc.check_in(&officer, "{not json").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

// ===========================================================================
// Issues
// ===========================================================================

#[tokio::test]
async fn issue_report_rejects_unknown_category() {
    let svc = IssueService::new(backend(), dispatcher());
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .report(
            &citizen,
            IssueReport {
                category: "weather".to_string(),
                title: "Too hot".to_string(),
                description: "Please fix".to_string(),
                location: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn issue_report_requires_title_and_description() {
    let svc = IssueService::new(backend(), dispatcher());
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .report(
            &citizen,
            IssueReport {
                category: "roads".to_string(),
                title: "  ".to_string(),
                description: "x".to_string(),
                location: None,
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("title"));
}

#[tokio::test]
async fn citizens_cannot_assign_issues() {
    let svc = IssueService::new(backend(), dispatcher());
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .assign(&citizen, "i-1", &UserId::new("o-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
}

// ===========================================================================
// Documents
// ===========================================================================

#[tokio::test]
async fn document_submit_rejects_unknown_kind() {
    let svc = DocumentService::new(backend(), dispatcher());
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .submit(
            &citizen,
            DocumentSubmission {
                kind: "selfie".to_string(),
                storage_path: "bucket/x.png".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn citizens_cannot_review_documents() {
    let svc = DocumentService::new(backend(), dispatcher());
    let citizen = identity("u-1", Role::Citizen);
    let err = svc
        .review(&citizen, "d-1", ReviewDecision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));
}

#[tokio::test]
async fn officers_pass_the_guard_and_reach_io() {
    // The officer is allowed, so the call proceeds to the (unreachable)
    // backend and fails there instead of at the guard.
    let svc = DocumentService::new(backend(), dispatcher());
    let officer = identity("o-1", Role::Officer);
    let err = svc
        .review(&officer, "d-1", ReviewDecision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
}
