//! Sequential dispatch with per-channel outcomes
//!
//! One appointment event fans out to SMS and email in order. A channel that
//! is down, slow, or unconfigured must not take the others — or the domain
//! operation that triggered the dispatch — down with it. Partial failure is
//! the report's job to describe, not an error.

use crate::channel::{Notification, NotificationChannel};
use civicport_core::config::NotifySection;
use crate::email::EmailChannel;
use crate::sms::SmsChannel;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelOutcome {
    Sent,
    Skipped(String),
    Failed(String),
}

impl ChannelOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelOutcome::Sent)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<(String, ChannelOutcome)>,
}

impl DispatchReport {
    /// At least one channel got the message out.
    pub fn delivered(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| o.is_sent())
    }

    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, o)| o)
    }

    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ChannelOutcome::Failed(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

pub struct Dispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            channels: Vec::new(),
            timeout,
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// The standard portal channel set: SMS first, then email.
    pub fn from_config(config: &NotifySection) -> Self {
        Self::new(Duration::from_millis(config.dispatch_timeout_ms))
            .with_channel(Arc::new(SmsChannel::new(&config.sms)))
            .with_channel(Arc::new(EmailChannel::new(&config.email)))
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub fn available_channels(&self) -> Vec<&str> {
        self.channels
            .iter()
            .filter(|c| c.is_available())
            .map(|c| c.name())
            .collect()
    }

    /// Send through every channel in order, one outcome per channel.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchReport {
        let mut report = DispatchReport::default();

        for channel in &self.channels {
            let name = channel.name().to_string();

            if !channel.is_available() {
                report
                    .outcomes
                    .push((name, ChannelOutcome::Skipped("not configured".to_string())));
                continue;
            }
            if channel.recipient(notification).is_none() {
                report.outcomes.push((
                    name,
                    ChannelOutcome::Skipped("no recipient on file".to_string()),
                ));
                continue;
            }

            let outcome = match tokio::time::timeout(self.timeout, channel.send(notification)).await
            {
                Ok(Ok(())) => {
                    info!(
                        "Dispatched {} via {}",
                        notification.kind.as_str(),
                        channel.name()
                    );
                    ChannelOutcome::Sent
                }
                Ok(Err(e)) => {
                    warn!(
                        "Dispatch of {} via {} failed: {e}",
                        notification.kind.as_str(),
                        channel.name()
                    );
                    ChannelOutcome::Failed(e.to_string())
                }
                Err(_) => {
                    warn!(
                        "Dispatch of {} via {} timed out after {}ms",
                        notification.kind.as_str(),
                        channel.name(),
                        self.timeout.as_millis()
                    );
                    ChannelOutcome::Failed(format!(
                        "timed out after {}ms",
                        self.timeout.as_millis()
                    ))
                }
            };
            report.outcomes.push((name, outcome));
        }

        report
    }
}
