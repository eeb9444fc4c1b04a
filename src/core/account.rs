//! Login and registration flows.
//!
//! Each flow validates locally first and only then talks to the server. The
//! server's own error text is logged, never shown; users see one fixed message
//! per flow.

use std::fmt;

use log::{info, warn};

use crate::api::ChatApi;
use crate::core::auth::AuthContext;
use crate::core::validation::{EmailPolicy, ValidationError};

pub const REGISTER_SUCCESS_TITLE: &str = "Account Created";
pub const REGISTER_SUCCESS_BODY: &str =
    "Your account has been created successfully. You can now log in.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Rejected locally; no request was made.
    Invalid(ValidationError),
    InvalidCredentials,
    RegistrationFailed,
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountError::Invalid(err) => write!(f, "{err}"),
            AccountError::InvalidCredentials => write!(f, "Invalid email or password"),
            AccountError::RegistrationFailed => {
                write!(f, "Registration failed. Email may already be in use.")
            }
        }
    }
}

impl std::error::Error for AccountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AccountError::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for AccountError {
    fn from(err: ValidationError) -> Self {
        AccountError::Invalid(err)
    }
}

/// Exchange credentials for a token and store it in `auth`.
pub async fn login(
    api: &dyn ChatApi,
    auth: &AuthContext,
    policy: &EmailPolicy,
    email: &str,
    password: &str,
) -> Result<(), AccountError> {
    let email = email.trim();
    policy.validate_login(email)?;

    match api.login(email, password).await {
        Ok(token) => {
            info!("Signed in");
            auth.set(token);
            Ok(())
        }
        Err(e) => {
            warn!("Login failed: {}", e);
            Err(AccountError::InvalidCredentials)
        }
    }
}

/// Create an account. Does not sign in.
pub async fn register(
    api: &dyn ChatApi,
    policy: &EmailPolicy,
    email: &str,
    password: &str,
) -> Result<(), AccountError> {
    let email = email.trim();
    policy.validate_registration(email, password)?;

    match api.register(email, password).await {
        Ok(_) => {
            info!("Registered a new account");
            Ok(())
        }
        Err(e) => {
            warn!("Registration failed: {}", e);
            Err(AccountError::RegistrationFailed)
        }
    }
}
