//! Route handlers

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod documents;
pub mod issues;

use civicport_notify::{ChannelOutcome, DispatchReport};
use serde_json::json;

/// Per-channel outcomes in a response body, so callers can see that a
/// booking stood even when a provider dropped the message.
pub(crate) fn report_json(report: &DispatchReport) -> serde_json::Value {
    let channels: serde_json::Map<String, serde_json::Value> = report
        .outcomes
        .iter()
        .map(|(name, outcome)| {
            let value = match outcome {
                ChannelOutcome::Sent => json!("sent"),
                ChannelOutcome::Skipped(reason) => json!({ "skipped": reason }),
                ChannelOutcome::Failed(reason) => json!({ "failed": reason }),
            };
            (name.clone(), value)
        })
        .collect();
    json!({ "delivered": report.delivered(), "channels": channels })
}
