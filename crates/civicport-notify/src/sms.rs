//! SMS channel — Twilio-style messages API

use crate::channel::{Notification, NotificationChannel};
use async_trait::async_trait;
use civicport_core::config::SmsSection;
use civicport_core::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

pub struct SmsChannel {
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    enabled: bool,
    client: reqwest::Client,
}

impl SmsChannel {
    /// Automatically derives `enabled` from config if not explicitly set.
    pub fn new(config: &SmsSection) -> Self {
        let configured = !config.account_sid.is_empty() && !config.from_number.is_empty();
        let enabled = config.enabled.unwrap_or(configured);
        Self {
            base_url: config.base_url.clone(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            enabled,
            client: reqwest::Client::new(),
        }
    }
}

fn e164_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("static regex"))
}

/// Strip separators and check the result is E.164-shaped.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if e164_re().is_match(&cleaned) {
        Ok(cleaned)
    } else {
        Err(Error::notify(
            "sms",
            format!("not an E.164 phone number: {raw}"),
        ))
    }
}

#[async_trait]
impl NotificationChannel for SmsChannel {
    fn name(&self) -> &str {
        "sms"
    }

    fn is_available(&self) -> bool {
        self.enabled && !self.account_sid.is_empty()
    }

    fn recipient<'a>(&self, notification: &'a Notification) -> Option<&'a str> {
        notification.to_phone.as_deref()
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let raw = notification
            .to_phone
            .as_deref()
            .ok_or_else(|| Error::notify("sms", "no phone recipient"))?;
        let to = normalize_phone(raw)?;

        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let form = [
            ("To", to.as_str()),
            ("From", self.from_number.as_str()),
            ("Body", notification.sms_body.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::notify("sms", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::notify(
                "sms",
                format!("{}: {}", status.as_u16(), body),
            ));
        }

        debug!("SMS {} sent to {to}", notification.kind.as_str());
        Ok(())
    }
}
