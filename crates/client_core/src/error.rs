use thiserror::Error;

/// Text shown whenever a failure carries no usable server message.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Login failed. Please try again.";

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both email and password";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every way a login attempt can end without a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("credentials rejected with status {status}")]
    CredentialsRejected { status: u16, message: Option<String> },
    #[error("auth endpoint unreachable: {0}")]
    Transport(String),
}

impl LoginError {
    /// The one message surfaced to the user. Rejections and transport failures
    /// look the same unless the server supplied its own text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.message().to_string(),
            Self::CredentialsRejected {
                message: Some(message),
                ..
            } => message.clone(),
            Self::CredentialsRejected { message: None, .. } | Self::Transport(_) => {
                LOGIN_FALLBACK_MESSAGE.to_string()
            }
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::CredentialsRejected { status, .. } => Some(*status),
            Self::Validation(_) | Self::Transport(_) => None,
        }
    }
}

impl From<reqwest::Error> for LoginError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}
