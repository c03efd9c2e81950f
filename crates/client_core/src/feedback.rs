//! Transient toast-style notifications with a single active slot.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub visible: bool,
}

pub struct FeedbackChannel {
    current: Arc<watch::Sender<Option<Notification>>>,
    ttl: Duration,
    next_id: u64,
    auto_dismiss: Option<JoinHandle<()>>,
}

impl FeedbackChannel {
    pub fn new(ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
            ttl,
            next_id: 0,
            auto_dismiss: None,
        }
    }

    /// Replaces whatever is showing, visible or not, and restarts the
    /// auto-dismiss timer. Must run inside a tokio runtime.
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) -> Notification {
        self.cancel();
        self.next_id += 1;
        let notification = Notification {
            id: self.next_id,
            message: message.into(),
            severity,
            visible: true,
        };
        self.current.send_replace(Some(notification.clone()));

        let current = Arc::clone(&self.current);
        let id = notification.id;
        let ttl = self.ttl;
        self.auto_dismiss = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if hide(&current, Some(id)) {
                tracing::debug!(notification = id, "notification auto-dismissed");
            }
        }));

        notification
    }

    /// Returns false when nothing visible was showing.
    pub fn dismiss(&mut self) -> bool {
        self.cancel();
        hide(&self.current, None)
    }

    /// Stops the auto-dismiss timer without touching the notification.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.auto_dismiss.take() {
            handle.abort();
        }
    }

    pub fn current(&self) -> Option<Notification> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.current.subscribe()
    }
}

impl Drop for FeedbackChannel {
    fn drop(&mut self) {
        self.cancel();
    }
}

// `only_id` keeps a stale timer from hiding a newer notification.
fn hide(current: &watch::Sender<Option<Notification>>, only_id: Option<u64>) -> bool {
    current.send_if_modified(|slot| match slot {
        Some(notification)
            if notification.visible && only_id.map_or(true, |id| id == notification.id) =>
        {
            notification.visible = false;
            true
        }
        _ => false,
    })
}

#[cfg(test)]
#[path = "tests/feedback_tests.rs"]
mod tests;
