//! Server-side session storage for the session middleware.
//!
//! The cookie carries only a random key; the state lives behind a
//! [`SessionRepository`]. Renewing or purging a session deletes its record,
//! so a key captured before login or logout no longer resolves.

use std::collections::HashMap;
use std::sync::Arc;

use actix_session::storage::{
    LoadError, SaveError, SessionKey, SessionStore, UpdateError, generate_session_key,
};
use actix_web::cookie::time::Duration;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::domain::ports::SessionRepository;

type SessionState = HashMap<String, String>;

/// [`SessionStore`] backed by a [`SessionRepository`] port.
#[derive(Clone)]
pub struct PortSessionStore {
    sessions: Arc<dyn SessionRepository>,
}

impl PortSessionStore {
    /// Store sessions through `sessions`.
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }
}

/// Current instant and the expiry `ttl` after it, saturating far in the
/// future.
fn window(ttl: &Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let expiry = TimeDelta::try_seconds(ttl.whole_seconds())
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (now, expiry)
}

fn encode(state: &SessionState) -> Result<String, serde_json::Error> {
    serde_json::to_string(state)
}

impl SessionStore for PortSessionStore {
    async fn load(&self, session_key: &SessionKey) -> Result<Option<SessionState>, LoadError> {
        let data = self
            .sessions
            .find(session_key.as_ref(), Utc::now())
            .await
            .map_err(|err| LoadError::Other(err.into()))?;
        data.map(|data| serde_json::from_str(&data))
            .transpose()
            .map_err(|err| LoadError::Deserialization(err.into()))
    }

    async fn save(&self, session_state: SessionState, ttl: &Duration) -> Result<SessionKey, SaveError> {
        let data = encode(&session_state).map_err(|err| SaveError::Serialization(err.into()))?;
        let (_, expiry) = window(ttl);
        let key = generate_session_key();
        self.sessions
            .insert(key.as_ref(), &data, expiry)
            .await
            .map_err(|err| SaveError::Other(err.into()))?;
        Ok(key)
    }

    async fn update(
        &self,
        session_key: SessionKey,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, UpdateError> {
        let data = encode(&session_state).map_err(|err| UpdateError::Serialization(err.into()))?;
        let (now, expiry) = window(ttl);
        let written = self
            .sessions
            .update(session_key.as_ref(), &data, expiry, now)
            .await
            .map_err(|err| UpdateError::Other(err.into()))?;
        if !written {
            // Deleted or expired while the request ran: never bring it back.
            warn!("session vanished before its changes were stored; dropping them");
        }
        Ok(session_key)
    }

    async fn update_ttl(&self, session_key: &SessionKey, ttl: &Duration) -> Result<(), anyhow::Error> {
        let (now, expiry) = window(ttl);
        self.sessions.touch(session_key.as_ref(), expiry, now).await?;
        Ok(())
    }

    async fn delete(&self, session_key: &SessionKey) -> Result<(), anyhow::Error> {
        self.sessions.delete(session_key.as_ref()).await?;
        Ok(())
    }
}

/// Remove expired sessions every `period`; runs until the task is dropped.
pub async fn sweep_expired_sessions(
    sessions: Arc<dyn SessionRepository>,
    period: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match sessions.delete_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "expired sessions swept"),
            Err(error) => warn!(%error, "session sweep failed"),
        }
    }
}
