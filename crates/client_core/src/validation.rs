//! Local checks run before any network activity.

use crate::{
    error::{ValidationError, MISSING_CREDENTIALS_MESSAGE},
    Credentials,
};

pub fn validate(credentials: &Credentials) -> Result<(), ValidationError> {
    if is_blank(credentials.email()) || is_blank(credentials.password()) {
        return Err(ValidationError::new(MISSING_CREDENTIALS_MESSAGE));
    }
    Ok(())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
