//! Backend auth endpoints — sign-up, password sign-in, token introspection

use crate::client::{map_send_err, BackendClient};
use civicport_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity as the backend's auth service reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// Display name from sign-up metadata, if the frontend recorded one.
    pub fn metadata_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(|v| v.as_str())
    }
}

/// Token pair handed out at sign-in; the access token authenticates every
/// subsequent portal request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    data: serde_json::Value,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

impl BackendClient {
    /// Register a new auth identity. The profile row is created separately at
    /// first login by profile resolution.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<AuthUser> {
        let body = SignUpRequest {
            email,
            password,
            phone,
            data: serde_json::json!({ "full_name": full_name }),
        };
        let response = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let user = response.json::<AuthUser>().await.map_err(map_send_err)?;
        debug!("Signed up {}", user.id);
        Ok(user)
    }

    /// Password sign-in; returns the token pair plus the identity.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let body = PasswordGrant { email, password };
        let response = self
            .client
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response.json::<AuthSession>().await.map_err(map_send_err)
    }

    /// Introspect an access token — who is this? 401s surface as auth errors.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response.json::<AuthUser>().await.map_err(map_send_err)
    }

    /// Exchange a refresh token for a fresh session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession> {
        let body = RefreshGrant { refresh_token };
        let response = self
            .client
            .post(self.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response.json::<AuthSession>().await.map_err(map_send_err)
    }

    /// Revoke a session server-side. Best effort: the gateway also drops its
    /// cached entry, which is what actually locks the token out of the portal.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_send_err)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_user_parses_minimal() {
        let json = r#"{"id":"u-1"}"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "u-1");
        assert!(user.email.is_none());
        assert!(user.metadata_name().is_none());
    }

    #[test]
    fn auth_user_metadata_name() {
        let json = r#"{"id":"u-1","email":"a@b.gov","user_metadata":{"full_name":"Ada Voss"}}"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.metadata_name(), Some("Ada Voss"));
    }

    #[test]
    fn auth_session_parses() {
        let json = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "user": {"id": "u-1", "email": "a@b.gov"}
        }"#;
        let session: AuthSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "at");
        assert_eq!(session.expires_in, Some(3600));
        assert_eq!(session.user.id, "u-1");
    }
}
