//! Profile resolution — the login-time race
//!
//! An authenticated user must end up with a profile no matter how the profile
//! table behaves. The lookup races a configured timeout; timeout, transport
//! failure, or a missing row all degrade to a fallback citizen profile so
//! login never blocks on a slow query.

use crate::auth::AuthUser;
use crate::client::BackendClient;
use civicport_core::{Profile, Role, UserId};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const PROFILE_TABLE: &str = "profiles";

#[derive(Serialize)]
struct NewProfileRow<'a> {
    id: &'a str,
    full_name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    role: Role,
}

/// Resolve the profile for an authenticated user, racing the table lookup
/// against `timeout`.
pub async fn resolve_profile(
    client: &BackendClient,
    user: &AuthUser,
    timeout: Duration,
) -> Profile {
    let lookup = client
        .from(PROFILE_TABLE)
        .eq("id", &user.id)
        .fetch_one::<Profile>();

    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(Some(mut profile))) => {
            if profile.full_name.is_empty() {
                if let Some(name) = user.metadata_name() {
                    profile.full_name = name.to_string();
                }
            }
            profile
        }
        Ok(Ok(None)) => {
            debug!("No profile row for {}, creating one", user.id);
            let profile = fallback_for(user);
            seed_profile(client, &profile).await;
            profile
        }
        Ok(Err(e)) => {
            warn!("Profile lookup failed for {}: {e}", user.id);
            fallback_for(user)
        }
        Err(_) => {
            warn!(
                "Profile lookup for {} timed out after {}ms",
                user.id,
                timeout.as_millis()
            );
            fallback_for(user)
        }
    }
}

fn fallback_for(user: &AuthUser) -> Profile {
    let email = user.email.clone().unwrap_or_default();
    let mut profile = Profile::fallback(
        UserId::new(user.id.clone()),
        email,
        user.phone.clone(),
    );
    if let Some(name) = user.metadata_name() {
        profile.full_name = name.to_string();
    }
    profile
}

/// Best-effort insert of the fallback row. Losing an insert race to a
/// concurrent login is expected and not an error.
async fn seed_profile(client: &BackendClient, profile: &Profile) {
    let row = NewProfileRow {
        id: profile.id.as_str(),
        full_name: &profile.full_name,
        email: &profile.email,
        phone: profile.phone.as_deref(),
        role: profile.role,
    };
    if let Err(e) = client
        .insert::<_, serde_json::Value>(PROFILE_TABLE, &[row])
        .await
    {
        debug!("Profile seed for {} skipped: {e}", profile.id);
    }
}
