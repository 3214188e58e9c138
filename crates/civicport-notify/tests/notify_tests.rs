//! Tests for civicport-notify: dispatch outcomes, partial failure, templates

use async_trait::async_trait;
use civicport_core::{Error, Result};
use civicport_notify::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scriptable channel for exercising the dispatcher.
struct FakeChannel {
    name: &'static str,
    available: bool,
    wants_phone: bool,
    fail: bool,
    delay: Option<Duration>,
    sends: AtomicUsize,
}

impl FakeChannel {
    fn ok(name: &'static str, wants_phone: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: true,
            wants_phone,
            fail: false,
            delay: None,
            sends: AtomicUsize::new(0),
        })
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: true,
            wants_phone: false,
            fail: true,
            delay: None,
            sends: AtomicUsize::new(0),
        })
    }

    fn slow(name: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: true,
            wants_phone: false,
            fail: false,
            delay: Some(delay),
            sends: AtomicUsize::new(0),
        })
    }

    fn down(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: false,
            wants_phone: false,
            fail: false,
            delay: None,
            sends: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl NotificationChannel for FakeChannel {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn recipient<'a>(&self, notification: &'a Notification) -> Option<&'a str> {
        if self.wants_phone {
            notification.to_phone.as_deref()
        } else {
            notification.to_email.as_deref()
        }
    }

    async fn send(&self, _notification: &Notification) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(Error::notify(self.name, "provider rejected message"))
        } else {
            Ok(())
        }
    }
}

fn notification(phone: Option<&str>, email: Option<&str>) -> Notification {
    Notification {
        kind: NotificationKind::AppointmentConfirmed,
        to_phone: phone.map(String::from),
        to_email: email.map(String::from),
        subject: "Appointment confirmed".to_string(),
        sms_body: "booked".to_string(),
        html_body: "<p>booked</p>".to_string(),
    }
}

// ===========================================================================
// Dispatcher — outcome per channel
// ===========================================================================

#[tokio::test]
async fn dispatch_all_channels_succeed() {
    let dispatcher = Dispatcher::new(Duration::from_secs(1))
        .with_channel(FakeChannel::ok("sms", true))
        .with_channel(FakeChannel::ok("email", false));

    let report = dispatcher
        .dispatch(&notification(Some("+15550001111"), Some("a@b.gov")))
        .await;

    assert!(report.delivered());
    assert!(report.outcome("sms").unwrap().is_sent());
    assert!(report.outcome("email").unwrap().is_sent());
    assert!(report.failures().is_empty());
}

#[tokio::test]
async fn partial_failure_is_reported_not_raised() {
    // SMS works, email provider rejects: the canonical partial failure.
    let dispatcher = Dispatcher::new(Duration::from_secs(1))
        .with_channel(FakeChannel::ok("sms", true))
        .with_channel(FakeChannel::failing("email"));

    let report = dispatcher
        .dispatch(&notification(Some("+15550001111"), Some("a@b.gov")))
        .await;

    assert!(report.delivered(), "one channel sent");
    assert!(report.outcome("sms").unwrap().is_sent());
    assert!(matches!(
        report.outcome("email").unwrap(),
        ChannelOutcome::Failed(msg) if msg.contains("provider rejected")
    ));
    assert_eq!(report.failures(), vec!["email"]);
}

#[tokio::test]
async fn unavailable_channel_is_skipped() {
    let dispatcher = Dispatcher::new(Duration::from_secs(1))
        .with_channel(FakeChannel::down("sms"))
        .with_channel(FakeChannel::ok("email", false));

    let report = dispatcher
        .dispatch(&notification(Some("+15550001111"), Some("a@b.gov")))
        .await;

    assert!(matches!(
        report.outcome("sms").unwrap(),
        ChannelOutcome::Skipped(reason) if reason.contains("not configured")
    ));
    assert!(report.delivered());
}

#[tokio::test]
async fn missing_recipient_is_skipped() {
    let sms = FakeChannel::ok("sms", true);
    let dispatcher = Dispatcher::new(Duration::from_secs(1))
        .with_channel(sms.clone())
        .with_channel(FakeChannel::ok("email", false));

    // no phone on file
    let report = dispatcher.dispatch(&notification(None, Some("a@b.gov"))).await;

    assert!(matches!(
        report.outcome("sms").unwrap(),
        ChannelOutcome::Skipped(reason) if reason.contains("no recipient")
    ));
    assert_eq!(sms.sends.load(Ordering::SeqCst), 0, "send never attempted");
    assert!(report.outcome("email").unwrap().is_sent());
}

#[tokio::test]
async fn slow_channel_times_out_and_later_channels_still_run() {
    let dispatcher = Dispatcher::new(Duration::from_millis(50))
        .with_channel(FakeChannel::slow("sms", Duration::from_secs(5)))
        .with_channel(FakeChannel::ok("email", false));

    let started = std::time::Instant::now();
    let report = dispatcher
        .dispatch(&notification(Some("+15550001111"), Some("a@b.gov")))
        .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(
        report.outcome("sms").unwrap(),
        ChannelOutcome::Failed(msg) if msg.contains("timed out")
    ));
    assert!(report.outcome("email").unwrap().is_sent());
}

#[tokio::test]
async fn nothing_delivered_when_everything_fails() {
    let dispatcher = Dispatcher::new(Duration::from_secs(1))
        .with_channel(FakeChannel::failing("sms"))
        .with_channel(FakeChannel::failing("email"));

    let report = dispatcher
        .dispatch(&notification(Some("+15550001111"), Some("a@b.gov")))
        .await;

    assert!(!report.delivered());
    assert_eq!(report.failures().len(), 2);
}

// ===========================================================================
// Templates
// ===========================================================================

mod template_fixtures {
    use chrono::{TimeZone, Utc};
    use civicport_core::*;

    pub fn profile() -> Profile {
        Profile {
            id: UserId::new("u-1"),
            full_name: "Ada Voss".to_string(),
            email: "ada@example.gov".to_string(),
            phone: Some("+15550001111".to_string()),
            role: Role::Citizen,
            created_at: Utc::now(),
        }
    }

    pub fn appointment() -> Appointment {
        Appointment {
            id: "apt-1".to_string(),
            citizen_id: UserId::new("u-1"),
            service: "permits".to_string(),
            scheduled_at: Utc.with_ymd_and_hms(2026, 9, 14, 10, 30, 0).unwrap(),
            location: "city-hall".to_string(),
            status: AppointmentStatus::Pending,
            officer_id: None,
            created_at: Utc::now(),
        }
    }
}

#[test]
fn confirmed_template_embeds_qr() {
    let n = templates::appointment_confirmed(
        &template_fixtures::appointment(),
        &template_fixtures::profile(),
        "data:image/png;base64,AAAA",
    );
    assert_eq!(n.kind, NotificationKind::AppointmentConfirmed);
    assert!(n.html_body.contains("data:image/png;base64,AAAA"));
    assert!(n.html_body.contains("Ada Voss"));
    assert!(n.sms_body.contains("apt-1"));
    assert_eq!(n.to_phone.as_deref(), Some("+15550001111"));
    assert_eq!(n.to_email.as_deref(), Some("ada@example.gov"));
}

#[test]
fn cancelled_template_has_no_qr() {
    let n = templates::appointment_cancelled(
        &template_fixtures::appointment(),
        &template_fixtures::profile(),
    );
    assert_eq!(n.kind, NotificationKind::AppointmentCancelled);
    assert!(!n.html_body.contains("img"));
    assert!(n.subject.contains("cancelled"));
}

fn issue_fixture(status: civicport_core::IssueStatus) -> civicport_core::Issue {
    civicport_core::Issue {
        id: "i-1".to_string(),
        reporter_id: civicport_core::UserId::new("u-1"),
        category: "roads".to_string(),
        title: "Pothole on 5th".to_string(),
        description: "deep".to_string(),
        location: None,
        status,
        assigned_to: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[test]
fn issue_update_template_humanizes_status() {
    let profile = template_fixtures::profile();
    let issue = issue_fixture(civicport_core::IssueStatus::InReview);
    let n = templates::issue_update(&issue, &profile, None);
    assert!(n.sms_body.contains("in review"));
    assert!(!n.sms_body.contains("in_review"));
}

#[test]
fn issue_update_template_carries_officer_note() {
    let profile = template_fixtures::profile();
    let issue = issue_fixture(civicport_core::IssueStatus::Resolved);
    let n = templates::issue_update(&issue, &profile, Some("Crew patched it this morning."));
    assert!(n.sms_body.contains("Crew patched it"));
    assert!(n.html_body.contains("Crew patched it"));

    let bare = templates::issue_update(&issue, &profile, None);
    assert!(!bare.html_body.contains("Note from"));
}
