//! Local form checks run before any auth request leaves the client.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Institutional domain accounts must belong to, unless configured otherwise.
pub const DEFAULT_EMAIL_DOMAIN: &str = "binus.ac.id";
pub const MIN_PASSWORD_CHARS: usize = 8;
/// A password needs at least one of these.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not shaped like an email address at all.
    MalformedEmail,
    /// Login attempted with an address outside the allowed domain.
    LoginDomain { domain: String },
    /// Registration attempted with an address outside the allowed domain.
    RegisterDomain { domain: String },
    WeakPassword,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MalformedEmail => write!(f, "Please enter a valid email address."),
            ValidationError::LoginDomain { domain } => {
                write!(f, "Please use your email address (@{domain}).")
            }
            ValidationError::RegisterDomain { domain } => {
                write!(f, "Registration requires an email address at @{domain}.")
            }
            ValidationError::WeakPassword => write!(
                f,
                "Password must be at least {MIN_PASSWORD_CHARS} characters and include \
                 uppercase, lowercase, number, and special character."
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Which addresses may sign in or register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPolicy {
    domain: String,
}

impl Default for EmailPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EMAIL_DOMAIN)
    }
}

impl EmailPolicy {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.trim().trim_start_matches('@').to_string(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `local@domain` with a non-empty, whitespace-free local part.
    /// The domain comparison ignores ASCII case.
    pub fn accepts(&self, email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };
        !local.is_empty()
            && !local.chars().any(char::is_whitespace)
            && domain.eq_ignore_ascii_case(&self.domain)
    }

    pub fn validate_login(&self, email: &str) -> Result<(), ValidationError> {
        if self.accepts(email) {
            Ok(())
        } else {
            Err(ValidationError::LoginDomain {
                domain: self.domain.clone(),
            })
        }
    }

    /// Checked in order: address shape, domain, password strength.
    pub fn validate_registration(&self, email: &str, password: &str) -> Result<(), ValidationError> {
        if !EMAIL_SHAPE.is_match(email) {
            return Err(ValidationError::MalformedEmail);
        }
        if !self.accepts(email) {
            return Err(ValidationError::RegisterDomain {
                domain: self.domain.clone(),
            });
        }
        if !is_strong_password(password) {
            return Err(ValidationError::WeakPassword);
        }
        Ok(())
    }
}

pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}
