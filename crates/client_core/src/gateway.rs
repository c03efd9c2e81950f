//! Contract with the remote authentication service and its reqwest-backed
//! implementation.

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::UserIdentity,
    error::ErrorBody,
    protocol::{LoginRequest, LoginResponse},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientConfig, error::LoginError, Credentials};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionResult {
    Success {
        identity: UserIdentity,
        token: String,
    },
    Failure {
        message: String,
        status_code: Option<u16>,
    },
}

impl From<LoginError> for SessionResult {
    fn from(value: LoginError) -> Self {
        Self::Failure {
            message: value.user_message(),
            status_code: value.status_code(),
        }
    }
}

impl From<LoginResponse> for SessionResult {
    fn from(value: LoginResponse) -> Self {
        Self::Success {
            identity: value.identity,
            token: value.token,
        }
    }
}

/// Never fails outright: every transport or server problem comes back as
/// `SessionResult::Failure`.
#[async_trait]
pub trait AuthSessionGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> SessionResult;
}

#[derive(Debug, Error)]
pub enum GatewaySetupError {
    #[error("invalid login url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HttpAuthGateway {
    http: Client,
    login_url: Url,
}

impl HttpAuthGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewaySetupError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            login_url: config.login_url()?,
        })
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    async fn try_login(&self, credentials: &Credentials) -> Result<LoginResponse, LoginError> {
        let res = self
            .http
            .post(self.login_url.clone())
            .json(&LoginRequest {
                email: credentials.email(),
                password: credentials.password(),
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let raw = res.bytes().await.unwrap_or_default();
            let body = ErrorBody::from_bytes(&raw);
            return Err(LoginError::CredentialsRejected {
                status: status.as_u16(),
                message: body.message().map(str::to_string),
            });
        }

        Ok(res.json::<LoginResponse>().await?)
    }
}

#[async_trait]
impl AuthSessionGateway for HttpAuthGateway {
    async fn login(&self, credentials: &Credentials) -> SessionResult {
        match self.try_login(credentials).await {
            Ok(body) => {
                debug!(url = %self.login_url, "login request accepted");
                body.into()
            }
            Err(err) => {
                warn!(url = %self.login_url, status = ?err.status_code(), error = %err, "login request failed");
                err.into()
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
