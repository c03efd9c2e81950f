use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity fields returned alongside the token on a successful login.
///
/// Kept as the raw JSON object so no server field shape can make a
/// successful login undecodable; the accessors read the common keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity {
    pub fields: Map<String, Value>,
}

impl UserIdentity {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// `_id` wins over `id`; numeric ids are rendered as text.
    pub fn id(&self) -> Option<String> {
        ["_id", "id"]
            .into_iter()
            .filter_map(|key| self.fields.get(key))
            .find_map(|value| match value {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn email(&self) -> Option<&str> {
        self.text("email")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn display_name(&self) -> String {
        self.name()
            .or(self.email())
            .map(str::to_string)
            .or_else(|| self.id())
            .unwrap_or_else(|| "unknown user".to_string())
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity: UserIdentity,
    pub token: String,
    pub established_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .field("established_at", &self.established_at)
            .finish()
    }
}
