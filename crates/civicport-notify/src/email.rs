//! Email channel — REST delivery provider

use crate::channel::{Notification, NotificationChannel};
use async_trait::async_trait;
use civicport_core::config::EmailSection;
use civicport_core::{Error, Result};
use serde_json::json;
use tracing::debug;

pub struct EmailChannel {
    base_url: String,
    api_key: String,
    from_address: String,
    enabled: bool,
    client: reqwest::Client,
}

impl EmailChannel {
    /// Automatically derives `enabled` from config if not explicitly set.
    pub fn new(config: &EmailSection) -> Self {
        let configured = !config.api_key.is_empty() && !config.from_address.is_empty();
        let enabled = config.enabled.unwrap_or(configured);
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
            enabled,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn is_available(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }

    fn recipient<'a>(&self, notification: &'a Notification) -> Option<&'a str> {
        notification.to_email.as_deref()
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let to = notification
            .to_email
            .as_deref()
            .ok_or_else(|| Error::notify("email", "no email recipient"))?;
        if !to.contains('@') {
            return Err(Error::notify("email", format!("not an email address: {to}")));
        }

        let payload = json!({
            "from": self.from_address,
            "to": [to],
            "subject": notification.subject,
            "html": notification.html_body,
        });

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::notify("email", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::notify(
                "email",
                format!("{}: {}", status.as_u16(), body),
            ));
        }

        debug!("Email {} sent to {to}", notification.kind.as_str());
        Ok(())
    }
}
