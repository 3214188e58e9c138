//! Session registry — cached token introspection
//!
//! The managed backend owns auth; the registry just caches the answer to
//! "whose token is this" so every request does not cost two backend calls.
//! Entries are keyed by token digest, never by the raw bearer token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use civicport_backend::{resolve_profile, AuthUser, BackendClient};
use civicport_core::{Profile, Result, Role, UserId};
use dashmap::DashMap;
use ring::digest;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A resolved caller: the auth identity plus its portal profile.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user: AuthUser,
    pub profile: Profile,
}

impl Identity {
    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn user_id(&self) -> &UserId {
        &self.profile.id
    }
}

struct SessionEntry {
    identity: Identity,
    expires_at: Instant,
}

pub struct SessionRegistry {
    entries: DashMap<String, SessionEntry>,
    ttl: Duration,
    profile_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration, profile_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            profile_timeout,
        }
    }

    /// Resolve a bearer token to an identity, consulting the cache first.
    pub async fn authenticate(
        &self,
        backend: &BackendClient,
        token: &str,
    ) -> Result<Identity> {
        let key = token_digest(token);

        if let Some(entry) = self.entries.get(&key) {
            if entry.expires_at > Instant::now() {
                return Ok(entry.identity.clone());
            }
        }

        let user = backend.get_user(token).await?;
        let profile = resolve_profile(backend, &user, self.profile_timeout).await;
        let identity = Identity { user, profile };

        debug!("Session cached for {}", identity.user_id());
        self.entries.insert(
            key,
            SessionEntry {
                identity: identity.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(identity)
    }

    /// Drop the cached entry on logout; the token is dead to the portal even
    /// if backend revocation lags.
    pub fn invalidate(&self, token: &str) {
        self.entries.remove(&token_digest(token));
    }

    /// Sweep entries past their TTL.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn token_digest(token: &str) -> String {
    let hash = digest::digest(&digest::SHA256, token.as_bytes());
    URL_SAFE_NO_PAD.encode(hash.as_ref())
}

/// Look up the profile behind a user id, for notification addressing.
/// A missing or failing lookup means nobody to notify, not a failed
/// operation.
pub async fn load_profile(backend: &BackendClient, user_id: &UserId) -> Option<Profile> {
    match backend
        .from(civicport_backend::profiles::PROFILE_TABLE)
        .eq("id", user_id)
        .fetch_one::<Profile>()
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Profile lookup for {user_id} failed: {e}");
            None
        }
    }
}
