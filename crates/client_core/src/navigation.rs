use std::fmt;

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Profile,
    Register,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Profile => "/profile",
            Self::Register => "/register",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Fire-and-forget page navigation.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);
}

/// Forwards navigations to whoever owns the router (UI loop, CLI, tests).
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate_to(&self, route: Route) {
        if self.tx.send(route).is_err() {
            tracing::debug!(%route, "navigation dropped: router is gone");
        }
    }
}
