//! Tests for civicport-core: ids, roles, entity lifecycles, errors, config

use civicport_core::*;

// ===========================================================================
// UserId
// ===========================================================================

#[test]
fn user_id_new_and_display() {
    let id = UserId::new("usr-123");
    assert_eq!(id.as_str(), "usr-123");
    assert_eq!(format!("{}", id), "usr-123");
}

#[test]
fn user_id_clone_is_cheap() {
    let id = UserId::new("usr-1");
    let cloned = id.clone();
    assert_eq!(id, cloned);
    assert_eq!(id.as_str(), cloned.as_str());
}

#[test]
fn user_id_from_string() {
    let id: UserId = "hello".into();
    assert_eq!(id.as_str(), "hello");
    let id2: UserId = String::from("world").into();
    assert_eq!(id2.as_str(), "world");
}

#[test]
fn user_id_equality_and_hash() {
    use std::collections::HashSet;
    let a = UserId::new("same");
    let b = UserId::new("same");
    let c = UserId::new("different");
    assert_eq!(a, b);
    assert_ne!(a, c);
    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&c));
}

#[test]
fn user_id_serde_is_plain_string() {
    let id = UserId::new("usr-9");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, r#""usr-9""#);
    let back: UserId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

// ===========================================================================
// Role
// ===========================================================================

#[test]
fn role_serde_roundtrip() {
    let roles = vec![Role::Citizen, Role::Officer, Role::Admin];
    for role in roles {
        let json = serde_json::to_string(&role).unwrap();
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(role, back);
    }
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Citizen).unwrap(), r#""citizen""#);
    assert_eq!(serde_json::to_string(&Role::Officer).unwrap(), r#""officer""#);
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
}

#[test]
fn role_staff_split() {
    assert!(!Role::Citizen.is_staff());
    assert!(Role::Officer.is_staff());
    assert!(Role::Admin.is_staff());
}

#[test]
fn role_parse() {
    assert_eq!(Role::parse("citizen"), Some(Role::Citizen));
    assert_eq!(Role::parse("officer"), Some(Role::Officer));
    assert_eq!(Role::parse("admin"), Some(Role::Admin));
    assert_eq!(Role::parse("superuser"), None);
}

#[test]
fn role_default_is_citizen() {
    assert_eq!(Role::default(), Role::Citizen);
}

// ===========================================================================
// Profile
// ===========================================================================

#[test]
fn profile_fallback_derives_name_from_email() {
    let p = Profile::fallback(UserId::new("u1"), "jordan@example.gov", None);
    assert_eq!(p.full_name, "jordan");
    assert_eq!(p.email, "jordan@example.gov");
    assert_eq!(p.role, Role::Citizen);
    assert!(p.phone.is_none());
}

#[test]
fn profile_null_name_deserializes_empty() {
    let json = r#"{
        "id": "u1",
        "full_name": null,
        "email": "jordan@example.gov",
        "role": "officer",
        "created_at": "2026-01-10T09:00:00Z"
    }"#;
    let p: Profile = serde_json::from_str(json).unwrap();
    assert_eq!(p.full_name, "");
    // the rest of the row survives the null
    assert_eq!(p.role, Role::Officer);
}

#[test]
fn profile_missing_role_defaults_to_citizen() {
    let json = r#"{
        "id": "u1",
        "full_name": "Jordan Lee",
        "email": "jordan@example.gov",
        "created_at": "2026-01-10T09:00:00Z"
    }"#;
    let p: Profile = serde_json::from_str(json).unwrap();
    assert_eq!(p.role, Role::Citizen);
}

// ===========================================================================
// AppointmentStatus
// ===========================================================================

#[test]
fn appointment_status_snake_case() {
    assert_eq!(
        serde_json::to_string(&AppointmentStatus::NoShow).unwrap(),
        r#""no_show""#
    );
    let back: AppointmentStatus = serde_json::from_str(r#""no_show""#).unwrap();
    assert_eq!(back, AppointmentStatus::NoShow);
}

#[test]
fn appointment_status_cancellable() {
    assert!(AppointmentStatus::Pending.cancellable());
    assert!(AppointmentStatus::Confirmed.cancellable());
    assert!(!AppointmentStatus::Completed.cancellable());
    assert!(!AppointmentStatus::Cancelled.cancellable());
    assert!(!AppointmentStatus::NoShow.cancellable());
}

// ===========================================================================
// Issue / Document serde
// ===========================================================================

#[test]
fn issue_optional_fields_skipped_when_none() {
    let issue = Issue {
        id: "i1".into(),
        reporter_id: UserId::new("u1"),
        category: "roads".into(),
        title: "Pothole".into(),
        description: "Deep pothole on 5th".into(),
        location: None,
        status: IssueStatus::Open,
        assigned_to: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let json = serde_json::to_string(&issue).unwrap();
    assert!(!json.contains("location"));
    assert!(!json.contains("assigned_to"));
}

#[test]
fn document_status_roundtrip() {
    for status in [
        DocumentStatus::Submitted,
        DocumentStatus::Approved,
        DocumentStatus::Rejected,
    ] {
        let json = serde_json::to_string(&status).unwrap();
        let back: DocumentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_auth_failed() {
    let e = Error::auth_failed("bad creds");
    assert!(e.to_string().contains("bad creds"));
    assert!(matches!(e, Error::AuthFailed { .. }));
}

#[test]
fn error_forbidden() {
    let e = Error::forbidden("citizen", "review documents");
    assert!(e.to_string().contains("citizen"));
    assert!(e.to_string().contains("review documents"));
}

#[test]
fn error_not_found() {
    let e = Error::not_found("appointment", "apt-9");
    assert!(e.to_string().contains("appointment"));
    assert!(e.to_string().contains("apt-9"));
}

#[test]
fn error_backend_carries_status() {
    let e = Error::backend(503, "unavailable");
    assert!(e.to_string().contains("503"));
    assert!(matches!(e, Error::Backend { status: 503, .. }));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let e: Error = io_err.into();
    assert!(matches!(e, Error::IoError(_)));
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let e: Error = json_err.into();
    assert!(matches!(e, Error::JsonError(_)));
}

#[test]
fn error_display_all_variants() {
    let errors: Vec<Error> = vec![
        Error::AuthFailed { reason: "x".into() },
        Error::Forbidden { role: "citizen".into(), action: "x".into() },
        Error::NotFound { entity: "issue".into(), id: "x".into() },
        Error::InvalidInput("x".into()),
        Error::Backend { status: 500, message: "x".into() },
        Error::Notify { channel: "sms".into(), message: "x".into() },
        Error::ConfigError("x".into()),
        Error::Timeout { operation: "profile lookup".into() },
        Error::Internal("x".into()),
    ];
    for e in errors {
        let _ = format!("{}", e);
    }
}

// ===========================================================================
// PortalConfig
// ===========================================================================

#[test]
fn config_defaults() {
    let config = PortalConfig::default();
    assert_eq!(config.gateway.port, 8610);
    assert_eq!(config.gateway.session_ttl_secs, 300);
    assert_eq!(config.backend.profile_timeout_ms, 4000);
    assert_eq!(config.notify.dispatch_timeout_ms, 10_000);
    assert_eq!(config.qr.module_size, 8);
}

#[test]
fn config_bind_mode_to_addr() {
    assert_eq!(config::BindMode::Loopback.to_addr(), "127.0.0.1");
    assert_eq!(config::BindMode::Lan.to_addr(), "0.0.0.0");
}

#[test]
fn config_parses_partial_json() {
    let json = r#"{
        "gateway": { "port": 9000 },
        "backend": { "url": "https://db.example.gov", "anon_key": "anon" }
    }"#;
    let config: PortalConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.backend.url, "https://db.example.gov");
    // untouched sections keep defaults
    assert_eq!(config.notify.sms.base_url, "https://api.twilio.com/2010-04-01");
    assert!(config.validate().is_ok());
}

#[test]
fn config_validate_requires_backend() {
    let config = PortalConfig::default();
    assert!(config.validate().is_err());
}

#[test]
fn config_load_missing_file_gives_defaults() {
    let config = PortalConfig::load(std::path::Path::new("/nonexistent/civicport.json"));
    assert_eq!(config.gateway.port, 8610);
}
