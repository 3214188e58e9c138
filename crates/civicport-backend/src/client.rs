//! Managed backend client
//!
//! The backend is the system of record: auth identities, profile rows, and
//! every portal table live there. This crate only speaks its HTTP API.

use civicport_core::config::BackendSection;
use civicport_core::Error;
use reqwest::Client;

pub struct BackendClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) service_key: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            anon_key: anon_key.into(),
            service_key: None,
        }
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn from_config(config: &BackendSection) -> Self {
        let mut client = Self::new(&config.url, &config.anon_key);
        if let Some(ref key) = config.service_key {
            client = client.with_service_key(key);
        }
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Key used for table access. The portal is a trusted backend-for-frontend,
    /// so it uses the service key when one is configured.
    pub(crate) fn table_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.anon_key)
    }

    /// Map a non-2xx backend response into a typed error.
    pub(crate) async fn error_from(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);
        match status {
            400 | 401 | 403 | 422 => Error::auth_failed(message),
            _ => Error::backend(status, message),
        }
    }
}

pub(crate) fn map_send_err(e: reqwest::Error) -> Error {
    Error::backend(0, e.to_string())
}

/// Backend error bodies come in a couple of shapes; pull out whichever
/// message field is present, falling back to the raw body.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(m) = value.get(key).and_then(|v| v.as_str()) {
                return m.to_string();
            }
        }
    }
    if body.is_empty() {
        "no response body".to_string()
    } else {
        body.to_string()
    }
}
