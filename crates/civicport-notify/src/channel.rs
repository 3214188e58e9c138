//! Notification channel trait and message envelope

use async_trait::async_trait;
use civicport_core::Result;
use serde::{Deserialize, Serialize};

/// What the notification is about; templates key off this.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentConfirmed,
    AppointmentCancelled,
    AppointmentReminder,
    IssueUpdate,
    DocumentReviewed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::AppointmentConfirmed => "appointment_confirmed",
            NotificationKind::AppointmentCancelled => "appointment_cancelled",
            NotificationKind::AppointmentReminder => "appointment_reminder",
            NotificationKind::IssueUpdate => "issue_update",
            NotificationKind::DocumentReviewed => "document_reviewed",
        }
    }
}

/// A rendered notification ready for dispatch. Carries both bodies; each
/// channel picks the one it can deliver.
#[derive(Clone, Debug)]
pub struct Notification {
    pub kind: NotificationKind,
    pub to_phone: Option<String>,
    pub to_email: Option<String>,
    pub subject: String,
    pub sms_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Configured and enabled. Unavailable channels are skipped, not failed.
    fn is_available(&self) -> bool;

    /// The recipient field this channel delivers to, if the notification
    /// carries one.
    fn recipient<'a>(&self, notification: &'a Notification) -> Option<&'a str>;

    async fn send(&self, notification: &Notification) -> Result<()>;
}
