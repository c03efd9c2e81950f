use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::{ClientConfig, FlowTimings};
use url::Url;

pub const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub login_path: Option<String>,
    pub request_timeout_secs: u64,
    pub notification_ttl_ms: u64,
    pub redirect_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let timings = FlowTimings::default();
        Self {
            api_base_url: "http://127.0.0.1:5000/api".into(),
            login_path: None,
            request_timeout_secs: 15,
            notification_ttl_ms: timings.notification_ttl.as_millis() as u64,
            redirect_delay_ms: timings.redirect_delay.as_millis() as u64,
        }
    }
}

impl Settings {
    pub fn into_client_config(self) -> anyhow::Result<ClientConfig> {
        let api_base_url = Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url: {}", self.api_base_url))?;
        let mut config = ClientConfig::new(api_base_url);
        if let Some(path) = self.login_path {
            config.login_path = path;
        }
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config.timings = FlowTimings {
            notification_ttl: Duration::from_millis(self.notification_ttl_ms),
            redirect_delay: Duration::from_millis(self.redirect_delay_ms),
        };
        Ok(config)
    }
}

pub fn load_settings() -> Settings {
    let file = read_settings_file(Path::new(SETTINGS_FILE));
    resolve_settings(file.as_ref(), |key| std::env::var(key).ok())
}

fn read_settings_file(path: &Path) -> Option<HashMap<String, String>> {
    let raw = fs::read_to_string(path).ok()?;
    match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
        Ok(table) => Some(
            table
                .into_iter()
                .map(|(key, value)| match value {
                    toml::Value::String(text) => (key, text),
                    other => (key, other.to_string()),
                })
                .collect(),
        ),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            None
        }
    }
}

/// Defaults, then the settings file, then `APP__*` environment variables.
fn resolve_settings(
    file_cfg: Option<&HashMap<String, String>>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(file_cfg) = file_cfg {
        if let Some(v) = file_cfg.get("api_base_url") {
            settings.api_base_url = v.clone();
        }
        if let Some(v) = file_cfg.get("login_path") {
            settings.login_path = Some(v.clone());
        }
        apply_number(&mut settings.request_timeout_secs, file_cfg.get("request_timeout_secs"));
        apply_number(&mut settings.notification_ttl_ms, file_cfg.get("notification_ttl_ms"));
        apply_number(&mut settings.redirect_delay_ms, file_cfg.get("redirect_delay_ms"));
    }

    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__LOGIN_PATH") {
        settings.login_path = Some(v);
    }
    apply_number(
        &mut settings.request_timeout_secs,
        env("APP__REQUEST_TIMEOUT_SECS").as_ref(),
    );
    apply_number(
        &mut settings.notification_ttl_ms,
        env("APP__NOTIFICATION_TTL_MS").as_ref(),
    );
    apply_number(
        &mut settings.redirect_delay_ms,
        env("APP__REDIRECT_DELAY_MS").as_ref(),
    );

    settings
}

fn apply_number(target: &mut u64, raw: Option<&String>) {
    if let Some(raw) = raw {
        match raw.trim().parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(value = %raw, "ignoring non-numeric setting"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
