//! Portal config — serde structs for civicport.json
//!
//! Pure types and parsing only. A missing file yields defaults; individual
//! leaves are overridable from the environment so containers can run without
//! a config file at all.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub gateway: GatewaySection,
    pub backend: BackendSection,
    pub notify: NotifySection,
    pub qr: QrSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub port: u16,
    pub bind: BindMode,
    /// How long an introspected token stays cached, in seconds.
    pub session_ttl_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            port: 8610,
            bind: BindMode::default(),
            session_ttl_secs: 300,
        }
    }
}

/// Bind mode for the gateway
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    Loopback,
    #[default]
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Base URL of the managed backend, e.g. https://xyz.supabase.co
    pub url: String,
    pub anon_key: String,
    pub service_key: Option<String>,
    /// Budget for the profile lookup race at login.
    pub profile_timeout_ms: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            service_key: None,
            profile_timeout_ms: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    pub sms: SmsSection,
    pub email: EmailSection,
    /// Per-channel send budget during dispatch.
    pub dispatch_timeout_ms: u64,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            sms: SmsSection::default(),
            email: EmailSection::default(),
            dispatch_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmsSection {
    pub enabled: Option<bool>,
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl Default for SmsSection {
    fn default() -> Self {
        Self {
            enabled: None,
            base_url: "https://api.twilio.com/2010-04-01".to_string(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailSection {
    pub enabled: Option<bool>,
    pub base_url: String,
    pub api_key: String,
    pub from_address: String,
}

impl Default for EmailSection {
    fn default() -> Self {
        Self {
            enabled: None,
            base_url: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from_address: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QrSection {
    /// HMAC secret for signing confirmation payloads.
    pub signing_secret: String,
    /// Pixel width of one QR module in the rendered PNG.
    pub module_size: u32,
}

impl Default for QrSection {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            module_size: 8,
        }
    }
}

impl PortalConfig {
    /// Load from a specific path. Malformed or missing files fall back to
    /// defaults with a warning; env overrides still apply afterwards.
    pub fn load(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Malformed config at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.apply_env();
        config
    }

    /// Discover from $CIVICPORT_CONFIG or ./civicport.json.
    pub fn discover() -> Self {
        Self::load(&Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        std::env::var("CIVICPORT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("civicport.json"))
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_var("CIVICPORT_PORT") {
            match v.parse() {
                Ok(port) => self.gateway.port = port,
                Err(e) => warn!("Invalid CIVICPORT_PORT value: {e}"),
            }
        }
        if let Some(v) = env_var("CIVICPORT_BACKEND_URL") {
            self.backend.url = v;
        }
        if let Some(v) = env_var("CIVICPORT_ANON_KEY") {
            self.backend.anon_key = v;
        }
        if let Some(v) = env_var("CIVICPORT_SERVICE_KEY") {
            self.backend.service_key = Some(v);
        }
        if let Some(v) = env_var("CIVICPORT_SMS_SID") {
            self.notify.sms.account_sid = v;
        }
        if let Some(v) = env_var("CIVICPORT_SMS_TOKEN") {
            self.notify.sms.auth_token = v;
        }
        if let Some(v) = env_var("CIVICPORT_SMS_FROM") {
            self.notify.sms.from_number = v;
        }
        if let Some(v) = env_var("CIVICPORT_EMAIL_KEY") {
            self.notify.email.api_key = v;
        }
        if let Some(v) = env_var("CIVICPORT_EMAIL_FROM") {
            self.notify.email.from_address = v;
        }
        if let Some(v) = env_var("CIVICPORT_QR_SECRET") {
            self.qr.signing_secret = v;
        }
    }

    /// The backend section is the one piece that cannot default its way to a
    /// working portal.
    pub fn validate(&self) -> crate::Result<()> {
        if self.backend.url.is_empty() {
            return Err(crate::Error::ConfigError(
                "backend.url is required (or CIVICPORT_BACKEND_URL)".to_string(),
            ));
        }
        if self.backend.anon_key.is_empty() {
            return Err(crate::Error::ConfigError(
                "backend.anon_key is required (or CIVICPORT_ANON_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
