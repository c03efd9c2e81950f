//! Process-wide session store and the single writer that fills it.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use shared::domain::{Session, UserIdentity};
use thiserror::Error;
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, info};

use crate::navigation::{Navigator, Route};

/// Readers must expect `None` until the first successful login.
#[derive(Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn establish_session(&self, identity: UserIdentity, token: String) -> Session {
        let session = Session {
            identity,
            token,
            established_at: Utc::now(),
        };
        *self.current.write().await = Some(session.clone());
        session
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Logout. Returns the session that was removed, if any.
    pub async fn clear(&self) -> Option<Session> {
        self.current.write().await.take()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("session already committed for attempt {0}")]
    AlreadyCommitted(u64),
}

pub struct SessionEstablisher {
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
    last_committed_attempt: Option<u64>,
    pending_navigation: Option<JoinHandle<()>>,
}

impl SessionEstablisher {
    pub fn new(
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            store,
            navigator,
            redirect_delay,
            last_committed_attempt: None,
            pending_navigation: None,
        }
    }

    /// Writes the session for `attempt` and schedules the profile redirect.
    /// Attempts must be committed in increasing order, at most once each.
    pub async fn commit(
        &mut self,
        attempt: u64,
        identity: UserIdentity,
        token: String,
    ) -> Result<Session, CommitError> {
        if self
            .last_committed_attempt
            .is_some_and(|last| last >= attempt)
        {
            return Err(CommitError::AlreadyCommitted(attempt));
        }
        self.last_committed_attempt = Some(attempt);

        let session = self.store.establish_session(identity, token).await;
        info!(attempt, "session established");
        self.schedule_navigation(Route::Profile);
        Ok(session)
    }

    /// Drops any session left by an earlier attempt.
    pub async fn revoke(&mut self) -> bool {
        self.cancel_pending();
        self.store.clear().await.is_some()
    }

    fn schedule_navigation(&mut self, route: Route) {
        self.cancel_pending();
        let navigator = Arc::clone(&self.navigator);
        let delay = self.redirect_delay;
        self.pending_navigation = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(%route, "deferred navigation fired");
            navigator.navigate_to(route);
        }));
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.pending_navigation
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Returns true if a navigation was still waiting to fire.
    pub fn cancel_pending(&mut self) -> bool {
        match self.pending_navigation.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

impl Drop for SessionEstablisher {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
