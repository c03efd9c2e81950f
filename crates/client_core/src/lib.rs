use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::domain::UserIdentity;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

pub mod config;
pub mod error;
pub mod feedback;
pub mod gateway;
pub mod navigation;
pub mod session;
pub mod validation;

pub use config::{ClientConfig, FlowTimings};
pub use error::{LoginError, ValidationError, LOGIN_FALLBACK_MESSAGE};
pub use feedback::{FeedbackChannel, Notification, Severity};
pub use gateway::{AuthSessionGateway, HttpAuthGateway, SessionResult};
pub use navigation::{ChannelNavigator, Navigator, Route};
pub use session::{SessionEstablisher, SessionStore};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful! Redirecting...";
const EVENT_CAPACITY: usize = 64;

/// Form contents. The password is wiped from memory when replaced, cleared
/// or dropped, and never shows up in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn clear(&mut self) {
        self.email.zeroize();
        self.password.zeroize();
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionState {
    /// True while an attempt owns the form; `submit` is ignored then.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed(String),
    Invalid(String),
    /// Another attempt was in flight; nothing was sent.
    AlreadySubmitting,
    /// The flow was torn down; the result was dropped untouched.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    StateChanged(SubmissionState),
    Notified(Notification),
}

/// Owns one login form: its fields, the submission state machine, the
/// notification slot, and the hand-off to the session store.
pub struct LoginFlow {
    gateway: Arc<dyn AuthSessionGateway>,
    navigator: Arc<dyn Navigator>,
    notifications: watch::Receiver<Option<Notification>>,
    inner: Mutex<LoginFlowState>,
    events: broadcast::Sender<LoginEvent>,
    /// Attempt whose `submit` future was dropped mid-flight, 0 if none.
    abandoned_attempt: AtomicU64,
}

struct LoginFlowState {
    state: SubmissionState,
    form: Credentials,
    inline_error: Option<String>,
    attempt: u64,
    torn_down: bool,
    feedback: FeedbackChannel,
    establisher: SessionEstablisher,
}

impl LoginFlow {
    pub fn new(
        gateway: Arc<dyn AuthSessionGateway>,
        session_store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        timings: FlowTimings,
    ) -> Arc<Self> {
        let feedback = FeedbackChannel::new(timings.notification_ttl);
        let notifications = feedback.subscribe();
        let establisher = SessionEstablisher::new(
            session_store,
            Arc::clone(&navigator),
            timings.redirect_delay,
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            gateway,
            navigator,
            notifications,
            inner: Mutex::new(LoginFlowState {
                state: SubmissionState::Idle,
                form: Credentials::default(),
                inline_error: None,
                attempt: 0,
                torn_down: false,
                feedback,
                establisher,
            }),
            events,
            abandoned_attempt: AtomicU64::new(0),
        })
    }

    pub async fn set_email(&self, email: impl Into<String>) {
        self.inner.lock().await.form.email = email.into();
    }

    pub async fn set_password(&self, password: impl Into<String>) {
        self.inner.lock().await.form.password = Zeroizing::new(password.into());
    }

    pub async fn credentials(&self) -> Credentials {
        self.inner.lock().await.form.clone()
    }

    pub async fn state(&self) -> SubmissionState {
        self.inner.lock().await.state.clone()
    }

    /// Standing error text shown under the form, if any.
    pub async fn inline_error(&self) -> Option<String> {
        self.inner.lock().await.inline_error.clone()
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn subscribe_notifications(&self) -> watch::Receiver<Option<Notification>> {
        self.notifications.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LoginEvent> {
        self.events.subscribe()
    }

    pub async fn dismiss_notification(&self) -> bool {
        self.inner.lock().await.feedback.dismiss()
    }

    pub async fn has_pending_navigation(&self) -> bool {
        self.inner.lock().await.establisher.has_pending_navigation()
    }

    pub fn open_registration(&self) {
        self.navigator.navigate_to(Route::Register);
    }

    /// Replaces the form contents, then submits them.
    pub async fn submit_credentials(&self, credentials: Credentials) -> SubmitOutcome {
        {
            let mut guard = self.inner.lock().await;
            self.release_abandoned(&mut guard);
            if !guard.torn_down && !guard.state.is_busy() {
                guard.form = credentials;
            }
        }
        self.submit().await
    }

    /// Runs one attempt with the current form contents.
    pub async fn submit(&self) -> SubmitOutcome {
        let (attempt, credentials) = {
            let mut guard = self.inner.lock().await;
            if guard.torn_down {
                return SubmitOutcome::Discarded;
            }
            self.release_abandoned(&mut guard);
            if guard.state.is_busy() {
                debug!(
                    attempt = guard.attempt,
                    state = guard.state.label(),
                    "submit ignored: attempt already in flight"
                );
                return SubmitOutcome::AlreadySubmitting;
            }

            guard.attempt += 1;
            self.transition(&mut guard, SubmissionState::Validating);

            let checked = validation::validate(&guard.form);
            if let Err(err) = checked {
                let message = LoginError::from(err).user_message();
                info!(attempt = guard.attempt, "login form rejected before submission");
                guard.inline_error = Some(message.clone());
                self.transition(&mut guard, SubmissionState::Idle);
                self.notify(&mut guard, message.clone(), Severity::Error);
                return SubmitOutcome::Invalid(message);
            }

            self.transition(&mut guard, SubmissionState::Submitting);
            (guard.attempt, guard.form.clone())
        };

        let in_flight = InFlightAttempt {
            flow: self,
            attempt,
            armed: true,
        };
        let result = self.gateway.login(&credentials).await;
        drop(credentials);

        let mut guard = self.inner.lock().await;
        if guard.torn_down || guard.attempt != attempt {
            in_flight.disarm();
            debug!(attempt, "login response discarded after teardown");
            return SubmitOutcome::Discarded;
        }

        let outcome = match result {
            SessionResult::Success { identity, token } => {
                self.finish_success(&mut guard, attempt, identity, token)
                    .await
            }
            SessionResult::Failure {
                message,
                status_code,
            } => {
                self.finish_failure(&mut guard, attempt, message, status_code)
                    .await
            }
        };
        in_flight.disarm();
        outcome
    }

    /// Unmount. Pending timers are cancelled and any response still in
    /// flight is dropped when it lands.
    pub async fn teardown(&self) {
        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return;
        }
        guard.torn_down = true;
        guard.form.clear();
        guard.feedback.cancel();
        let cancelled_navigation = guard.establisher.cancel_pending();
        info!(
            attempt = guard.attempt,
            cancelled_navigation, "login flow torn down"
        );
    }

    async fn finish_success(
        &self,
        guard: &mut LoginFlowState,
        attempt: u64,
        identity: UserIdentity,
        token: String,
    ) -> SubmitOutcome {
        if let Err(err) = guard.establisher.commit(attempt, identity, token).await {
            warn!(attempt, error = %err, "session commit refused");
            return self
                .finish_failure(guard, attempt, LOGIN_FALLBACK_MESSAGE.to_string(), None)
                .await;
        }
        guard.form.clear();
        guard.inline_error = None;
        self.transition(guard, SubmissionState::Succeeded);
        self.notify(guard, LOGIN_SUCCESS_MESSAGE, Severity::Success);
        info!(attempt, "login succeeded");
        SubmitOutcome::Succeeded
    }

    async fn finish_failure(
        &self,
        guard: &mut LoginFlowState,
        attempt: u64,
        message: String,
        status_code: Option<u16>,
    ) -> SubmitOutcome {
        let reason = if message.trim().is_empty() {
            LOGIN_FALLBACK_MESSAGE.to_string()
        } else {
            message
        };
        info!(attempt, status = ?status_code, "login attempt failed");

        if guard.establisher.revoke().await {
            info!(attempt, "earlier session revoked by failed login");
        }
        guard.inline_error = Some(reason.clone());
        self.transition(guard, SubmissionState::Failed(reason.clone()));
        self.notify(guard, reason.clone(), Severity::Error);
        SubmitOutcome::Failed(reason)
    }

    /// Hands the form back when the attempt that owns it was cancelled.
    fn release_abandoned(&self, guard: &mut LoginFlowState) {
        let abandoned = self.abandoned_attempt.load(Ordering::SeqCst);
        if abandoned == 0
            || abandoned != guard.attempt
            || guard.torn_down
            || guard.state != SubmissionState::Submitting
        {
            return;
        }
        self.abandoned_attempt.store(0, Ordering::SeqCst);
        info!(attempt = abandoned, "login attempt cancelled before completion");
        self.transition(guard, SubmissionState::Idle);
    }

    fn transition(&self, guard: &mut LoginFlowState, next: SubmissionState) {
        debug!(
            attempt = guard.attempt,
            from = guard.state.label(),
            to = next.label(),
            "login state transition"
        );
        guard.state = next.clone();
        let _ = self.events.send(LoginEvent::StateChanged(next));
    }

    fn notify(&self, guard: &mut LoginFlowState, message: impl Into<String>, severity: Severity) {
        let notification = guard.feedback.notify(message, severity);
        let _ = self.events.send(LoginEvent::Notified(notification));
    }
}

/// Marks an attempt abandoned if its `submit` future is dropped before the
/// response is applied. The lock may be held elsewhere at that point, in
/// which case the next `submit` performs the reset.
struct InFlightAttempt<'a> {
    flow: &'a LoginFlow,
    attempt: u64,
    armed: bool,
}

impl InFlightAttempt<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightAttempt<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.flow
            .abandoned_attempt
            .store(self.attempt, Ordering::SeqCst);
        if let Ok(mut guard) = self.flow.inner.try_lock() {
            self.flow.release_abandoned(&mut guard);
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
