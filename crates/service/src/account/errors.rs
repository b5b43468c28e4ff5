use thiserror::Error;

use super::validation::{messages, FieldErrors, NON_FIELD_ERRORS};

/// Business errors for registration, profile update and login workflows
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation failed: {0}")]
    Invalid(FieldErrors),
    #[error("a user with that {field} already exists")]
    Uniqueness { field: &'static str },
    #[error("city is not valid regarding country")]
    Relationship,
    #[error("missing field {field}: {message}")]
    MissingField { field: &'static str, message: &'static str },
    #[error("password and confirm_password does not match")]
    Mismatch,
    #[error("current and new password must not be same")]
    SameValue,
    #[error("invalid credentials: {message}")]
    InvalidCredential { field: &'static str, message: &'static str },
    #[error("account is not active")]
    InactiveAccount,
    #[error("not authenticated: {0}")]
    Unauthenticated(&'static str),
    #[error("token limit per user exceeded")]
    TokenLimitExceeded,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("token lifetime out of range")]
    TokenLifetime,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AccountError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AccountError::Invalid(_) => 1001,
            AccountError::Uniqueness { .. } => 1002,
            AccountError::Relationship => 1003,
            AccountError::MissingField { .. } => 1004,
            AccountError::Mismatch => 1005,
            AccountError::SameValue => 1006,
            AccountError::InvalidCredential { .. } => 1007,
            AccountError::InactiveAccount => 1008,
            AccountError::Unauthenticated(_) => 1009,
            AccountError::TokenLimitExceeded => 1010,
            AccountError::NotFound(_) => 1011,
            AccountError::Conflict(_) => 1012,
            AccountError::HashError(_) => 1101,
            AccountError::TokenLifetime => 1102,
            AccountError::Repository(_) => 1200,
        }
    }

    pub fn uniqueness(field: &'static str) -> Self { AccountError::Uniqueness { field } }

    /// Field-keyed payload for validation failures; `None` for everything else.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            AccountError::Invalid(errors) => Some(errors.clone()),
            AccountError::Uniqueness { field } => {
                Some(FieldErrors::single(field, format!("A user with that {} already exists.", field)))
            }
            AccountError::Relationship => Some(FieldErrors::single(NON_FIELD_ERRORS, messages::CITY_NOT_IN_COUNTRY)),
            AccountError::MissingField { field, message }
            | AccountError::InvalidCredential { field, message } => Some(FieldErrors::single(field, *message)),
            AccountError::Mismatch => Some(FieldErrors::single("confirm_password", messages::PASSWORDS_MISMATCH)),
            AccountError::SameValue => Some(FieldErrors::single("password", messages::SAME_PASSWORD)),
            AccountError::InactiveAccount => Some(FieldErrors::single(NON_FIELD_ERRORS, messages::INACTIVE_ACCOUNT)),
            _ => None,
        }
    }

    /// Infrastructure failures, as opposed to anything the caller can correct.
    pub fn is_internal(&self) -> bool {
        matches!(self, AccountError::HashError(_) | AccountError::TokenLifetime | AccountError::Repository(_))
    }
}

impl From<FieldErrors> for AccountError {
    fn from(errors: FieldErrors) -> Self { AccountError::Invalid(errors) }
}

impl From<models::errors::ModelError> for AccountError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::UniqueViolation(msg) => AccountError::Conflict(msg),
            models::errors::ModelError::Validation(msg) => AccountError::Repository(msg),
            models::errors::ModelError::Db(msg) => AccountError::Repository(msg),
        }
    }
}
