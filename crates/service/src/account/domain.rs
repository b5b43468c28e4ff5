use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validation::username_validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender {other:?}")),
        }
    }
}

/// Registration / profile update input.
///
/// Every field is optional at the type level: registration and full updates
/// enforce presence during validation, partial updates accept any subset.
/// `confirm_password` and `current_password` are write-only and never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UserInput {
    #[validate(
        length(max = 150, message = "Ensure this field has no more than 150 characters."),
        custom(function = "username_validator")
    )]
    pub username: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: Option<String>,
    pub gender: Option<Gender>,
    #[validate(range(min = 0, max = 150, message = "Ensure this value is between 0 and 150."))]
    pub age: Option<i32>,
    pub country: Option<i32>,
    pub city: Option<i32>,
    pub password: Option<String>,
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub confirm_password: Option<String>,
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub current_password: Option<String>,
}

/// Input after validation. `confirm_password` has been consumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedUser {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub country: Option<i32>,
    pub city: Option<i32>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

impl From<UserInput> for ValidatedUser {
    fn from(input: UserInput) -> Self {
        Self {
            username: input.username,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            gender: input.gender,
            age: input.age,
            country: input.country,
            city: input.city,
            password: input.password,
            current_password: input.current_password,
        }
    }
}

/// Domain user (business view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub age: i32,
    pub country_id: i32,
    pub city_id: i32,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Values for a user that is about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub age: i32,
    pub country_id: i32,
    pub city_id: i32,
    pub password_hash: String,
}

/// Changes applied by a profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub country_id: Option<i32>,
    pub city_id: Option<i32>,
    pub password_hash: Option<String>,
}

/// Public representation of a user; never carries password material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub age: i32,
    pub country: i32,
    pub city: i32,
}

impl From<&UserRecord> for UserView {
    fn from(u: &UserRecord) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            gender: u.gender,
            age: u.age,
            country: u.country_id,
            city: u.city_id,
        }
    }
}

/// Login input
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginInput {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 300, message = "Ensure this field has no more than 300 characters.")
    )]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login result: the plaintext token is only ever returned here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginOutput {
    pub token: String,
    pub user_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: i32,
    pub name: String,
    pub country_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityView {
    pub id: i32,
    pub name: String,
}

/// `{id, name, cities: [{id, name}]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryView {
    pub id: i32,
    pub name: String,
    pub cities: Vec<CityView>,
}

impl CountryView {
    /// Project a country and its cities; cities are listed in id order.
    pub fn from_records(country: CountryRecord, cities: Vec<CityRecord>) -> Self {
        let mut cities: Vec<CityView> = cities
            .into_iter()
            .map(|c| CityView { id: c.id, name: c.name })
            .collect();
        cities.sort_by_key(|c| c.id);
        Self { id: country.id, name: country.name, cities }
    }
}

/// Persisted token (digest only)
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub id: Uuid,
    pub user_id: i32,
    pub token_key: String,
    pub digest: String,
    pub created_at: DateTime<Utc>,
    pub expiry: Option<DateTime<Utc>>,
}

impl TokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map(|e| e < now).unwrap_or(false)
    }
}

/// A user resolved from a presented login token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserRecord,
    pub token: TokenRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::validation::messages;

    #[test]
    fn country_view_orders_cities() {
        let view = CountryView::from_records(
            CountryRecord { id: 1, name: "Norway".into() },
            vec![
                CityRecord { id: 7, name: "Bergen".into(), country_id: 1 },
                CityRecord { id: 3, name: "Oslo".into(), country_id: 1 },
            ],
        );
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["cities"][0]["id"], 3);
        assert_eq!(json["cities"][1]["name"], "Bergen");
        assert!(json["cities"][0].get("country_id").is_none());
    }

    #[test]
    fn user_view_has_no_password_material() {
        let input: UserInput = serde_json::from_value(serde_json::json!({
            "username": "alice", "email": "a@x.com", "gender": "female", "age": 30,
            "country": 1, "city": 1, "password": "Secret123", "confirm_password": "Secret123",
            "id": 99
        }))
        .unwrap();
        assert_eq!(input.gender, Some(Gender::Female));

        let record = UserRecord {
            id: 1,
            username: "alice".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: "a@x.com".into(),
            gender: Gender::Female,
            age: 30,
            country_id: 1,
            city_id: 1,
            password_hash: "hash".into(),
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };
        let json = serde_json::to_value(UserView::from(&record)).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["id"], 1);
        assert_eq!(obj["country"], 1);
        for secret in ["password", "confirm_password", "current_password", "password_hash"] {
            assert!(!obj.contains_key(secret));
        }
    }

    #[test]
    fn field_rules_report_messages() {
        let input = UserInput {
            username: Some("bad name".into()),
            email: Some("not-an-email".into()),
            age: Some(200),
            ..Default::default()
        };
        let errors = crate::account::validation::FieldErrors::from(input.validate().unwrap_err());
        assert_eq!(errors.get("username").unwrap(), &[messages::INVALID_USERNAME.to_string()]);
        assert_eq!(errors.get("email").unwrap(), &[messages::INVALID_EMAIL.to_string()]);
        assert_eq!(errors.get("age").unwrap(), &[messages::AGE_RANGE.to_string()]);
    }

    #[test]
    fn token_expiry() {
        let now = Utc::now();
        let mut t = TokenRecord {
            id: Uuid::new_v4(),
            user_id: 1,
            token_key: "abc".into(),
            digest: "d".into(),
            created_at: now,
            expiry: None,
        };
        assert!(!t.is_expired(now));
        t.expiry = Some(now - chrono::Duration::seconds(1));
        assert!(t.is_expired(now));
    }
}
