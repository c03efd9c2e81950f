use std::time::Duration;

use shared::protocol::LOGIN_PATH;
use url::Url;

pub const NOTIFICATION_TTL: Duration = Duration::from_millis(6000);
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimings {
    /// How long a notification stays visible unless dismissed.
    pub notification_ttl: Duration,
    /// Delay between a committed session and the profile navigation.
    pub redirect_delay: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            notification_ttl: NOTIFICATION_TTL,
            redirect_delay: REDIRECT_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub login_path: String,
    pub request_timeout: Duration,
    pub timings: FlowTimings,
}

impl ClientConfig {
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            login_path: LOGIN_PATH.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            timings: FlowTimings::default(),
        }
    }

    /// Full login URL. The base path is kept, so `http://host/api` plus
    /// `/users/login` yields `http://host/api/users/login`.
    pub fn login_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.api_base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(self.login_path.trim_start_matches('/'))
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
