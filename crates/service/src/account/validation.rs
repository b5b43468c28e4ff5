//! Field-keyed validation errors and the per-field rules shared by the
//! registration, profile update and login inputs.

use std::{borrow::Cow, collections::BTreeMap, fmt};

use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// Key used for failures that span several fields.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Human-readable messages returned to clients.
pub mod messages {
    pub const REQUIRED: &str = "This field is required.";
    pub const BLANK: &str = "This field may not be blank.";
    pub const INVALID_STRING: &str = "Not a valid string.";
    pub const INVALID_INTEGER: &str = "A valid integer is required.";
    pub const INVALID_EMAIL: &str = "Enter a valid email address.";
    pub const INVALID_USERNAME: &str =
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
    pub const AGE_RANGE: &str = "Ensure this value is between 0 and 150.";

    pub const CITY_NOT_IN_COUNTRY: &str = "City is not valid regarding Country";
    pub const PASSWORDS_REQUIRED: &str = "Please provide both password and confirm_password fields";
    pub const PASSWORDS_MISMATCH: &str = "password and confirm_password does not match";
    pub const CURRENT_PASSWORD_REQUIRED: &str = "Please provide Current password";
    pub const SAME_PASSWORD: &str = "The Current password and New Password must not be same";
    pub const CURRENT_PASSWORD_INVALID: &str = "Current password is invalid";
    pub const INVALID_LOGIN: &str = "Invalid username/password. Please try again!";
    pub const INACTIVE_ACCOUNT: &str = "Account is not active.";
    pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
    pub const INVALID_TOKEN: &str = "Invalid token.";
    pub const INACTIVE_TOKEN_USER: &str = "User inactive or deleted.";
    pub const TOKEN_LIMIT: &str = "Maximum amount of tokens allowed per user exceeded.";

    pub fn invalid_pk(id: impl std::fmt::Display) -> String {
        format!("Invalid pk \"{}\" - object does not exist.", id)
    }

    pub fn incorrect_pk_type(received: &str) -> String {
        format!("Incorrect type. Expected pk value, received {}.", received)
    }

    pub fn invalid_choice(value: &str) -> String {
        format!("\"{}\" is not a valid choice.", value)
    }

    pub fn expected_object(received: &str) -> String {
        format!("Invalid data. Expected a dictionary, but got {}.", received)
    }
}

/// `field -> [messages]`, serialized as a plain JSON object in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msgs)| format!("{}: {}", field, msgs.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let msg = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(&field, msg);
            }
        }
        out
    }
}

/// Non-blank; letters, digits and `@ . + - _` only.
pub fn username_validator(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed(messages::BLANK));
        return Err(err);
    }
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_username");
        err.message = Some(Cow::Borrowed(messages::INVALID_USERNAME));
        Err(err)
    }
}

/// Record "This field is required." for every `(field, present)` pair that is missing.
pub fn require_fields(errors: &mut FieldErrors, fields: &[(&str, bool)]) {
    for (field, present) in fields {
        if !present && !errors.contains(field) {
            errors.add(field, messages::REQUIRED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_object() {
        let mut e = FieldErrors::single("confirm_password", messages::PASSWORDS_MISMATCH);
        e.add(NON_FIELD_ERRORS, messages::CITY_NOT_IN_COUNTRY);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["confirm_password"][0], messages::PASSWORDS_MISMATCH);
        assert_eq!(json[NON_FIELD_ERRORS][0], messages::CITY_NOT_IN_COUNTRY);
    }

    #[test]
    fn username_charset() {
        assert!(username_validator("alice.b+c-d_e@x").is_ok());
        assert!(username_validator("émile").is_ok());
        assert!(username_validator("has space").is_err());
        assert!(username_validator("semi;colon").is_err());
        assert!(username_validator("").is_err());
    }

    #[test]
    fn require_fields_keeps_existing_errors() {
        let mut e = FieldErrors::single("email", messages::INVALID_EMAIL);
        require_fields(&mut e, &[("email", false), ("age", false), ("city", true)]);
        assert_eq!(e.get("email").unwrap().len(), 1);
        assert_eq!(e.get("age").unwrap(), &[messages::REQUIRED.to_string()]);
        assert!(!e.contains("city"));
    }
}
