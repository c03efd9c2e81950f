use serde::{Deserialize, Serialize};

use crate::domain::UserIdentity;

pub const LOGIN_PATH: &str = "/users/login";

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub identity: UserIdentity,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
