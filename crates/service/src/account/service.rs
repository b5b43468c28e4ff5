use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::domain::{
    CountryView, LoginInput, LoginOutput, NewUser, Session, UserChanges, UserInput, UserRecord, ValidatedUser,
};
use super::errors::AccountError;
use super::password::{hash_password, verify_password, PasswordPolicy, UserAttributes};
use super::repository::AccountRepository;
use super::token::{digests_match, hash_token, new_token, token_key};
use super::validation::{messages, require_fields, FieldErrors, NON_FIELD_ERRORS};

/// Account service configuration
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// `None` issues tokens that never expire.
    pub token_ttl: Option<Duration>,
    pub token_limit_per_user: Option<usize>,
    pub password_policy: PasswordPolicy,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self { token_ttl: Some(Duration::hours(10)), token_limit_per_user: None, password_policy: PasswordPolicy::default() }
    }
}

impl AccountConfig {
    /// TTLs above `configs::MAX_TOKEN_TTL_SECS` are clamped to it.
    pub fn from_settings(settings: &configs::AuthSettings) -> Self {
        let token_ttl = match settings.token_ttl_secs {
            0 => None,
            secs => Duration::try_seconds(secs.min(configs::MAX_TOKEN_TTL_SECS) as i64),
        };
        Self {
            token_ttl,
            token_limit_per_user: settings.token_limit_per_user,
            password_policy: PasswordPolicy { min_length: settings.password_min_length },
        }
    }
}

/// Registration, profile and login workflows, independent of the web framework.
pub struct AccountService<R: AccountRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AccountConfig,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AccountError> {
    value.ok_or_else(|| AccountError::Invalid(FieldErrors::single(field, messages::REQUIRED)))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl<R: AccountRepository + ?Sized> AccountService<R> {
    pub fn new(repo: Arc<R>, cfg: AccountConfig) -> Self { Self { repo, cfg } }

    pub fn config(&self) -> &AccountConfig { &self.cfg }

    /// Validate create or update input.
    ///
    /// `instance` is the stored user on update and `None` on create.
    /// `partial` relaxes the required-field rules (PATCH).
    /// Field rules run first; cross-field checks only run once every field
    /// is valid, in order: username uniqueness, email uniqueness, city/country
    /// relationship, then password confirmation.
    #[instrument(skip(self, input, instance), fields(user_id = instance.map(|u| u.id)))]
    pub async fn validate(
        &self,
        input: UserInput,
        instance: Option<&UserRecord>,
        partial: bool,
    ) -> Result<ValidatedUser, AccountError> {
        self.validate_fields(&input, instance, partial).await?;

        let own_id = instance.map(|u| u.id);
        if let Some(username) = input.username.as_deref() {
            if let Some(other) = self.repo.find_active_user_by_username(username).await? {
                if Some(other.id) != own_id {
                    debug!(username, "username taken");
                    return Err(AccountError::uniqueness("username"));
                }
            }
        }
        if let Some(email) = input.email.as_deref() {
            if let Some(other) = self.repo.find_active_user_by_email(email).await? {
                if Some(other.id) != own_id {
                    debug!(email, "email taken");
                    return Err(AccountError::uniqueness("email"));
                }
            }
        }

        let country = input.country.or(instance.map(|u| u.country_id));
        let city = input.city.or(instance.map(|u| u.city_id));
        if let (Some(country), Some(city)) = (country, city) {
            match self.repo.get_city(city).await? {
                Some(c) if c.country_id == country => {}
                _ => return Err(AccountError::Relationship),
            }
        }

        let password = non_empty(&input.password);
        let confirm = non_empty(&input.confirm_password);
        match (instance, password, confirm) {
            (None, Some(p), Some(c)) if p != c => return Err(AccountError::Mismatch),
            (None, Some(_), Some(_)) => {}
            (None, _, _) => {
                return Err(AccountError::MissingField {
                    field: NON_FIELD_ERRORS,
                    message: messages::PASSWORDS_REQUIRED,
                })
            }
            (Some(_), Some(p), Some(c)) if p != c => return Err(AccountError::Mismatch),
            (Some(_), _, _) => {}
        }

        Ok(ValidatedUser::from(input))
    }

    async fn validate_fields(
        &self,
        input: &UserInput,
        instance: Option<&UserRecord>,
        partial: bool,
    ) -> Result<(), AccountError> {
        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if !partial {
            require_fields(
                &mut errors,
                &[
                    ("username", input.username.is_some()),
                    ("email", input.email.is_some()),
                    ("gender", input.gender.is_some()),
                    ("age", input.age.is_some()),
                    ("country", input.country.is_some()),
                    ("city", input.city.is_some()),
                ],
            );
        }

        if let Some(id) = input.country {
            if self.repo.get_country(id).await?.is_none() {
                errors.add("country", messages::invalid_pk(id));
            }
        }
        if let Some(id) = input.city {
            if self.repo.get_city(id).await?.is_none() {
                errors.add("city", messages::invalid_pk(id));
            }
        }

        match (input.password.as_deref(), instance) {
            (Some(""), Some(_)) => errors.add("password", messages::BLANK),
            (Some(password), _) if !password.is_empty() => {
                let attrs = UserAttributes {
                    username: input.username.as_deref().or(instance.map(|u| u.username.as_str())),
                    first_name: input.first_name.as_deref().or(instance.map(|u| u.first_name.as_str())),
                    last_name: input.last_name.as_deref().or(instance.map(|u| u.last_name.as_str())),
                    email: input.email.as_deref().or(instance.map(|u| u.email.as_str())),
                };
                for problem in self.cfg.password_policy.check(password, &attrs) {
                    errors.add("password", problem);
                }
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            debug!(fields = %errors, "field validation failed");
            Err(AccountError::Invalid(errors))
        }
    }

    /// Validate and create a new user.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::account::{AccountConfig, AccountService, domain::{Gender, UserInput}};
    /// use service::account::repository::mock::MockAccountRepository;
    ///
    /// let repo = Arc::new(MockAccountRepository::default());
    /// repo.add_country(1, "Norway");
    /// repo.add_city(1, 1, "Oslo");
    /// let svc = AccountService::new(repo, AccountConfig::default());
    /// let input = UserInput {
    ///     username: Some("alice".into()),
    ///     email: Some("a@x.com".into()),
    ///     gender: Some(Gender::Female),
    ///     age: Some(30),
    ///     country: Some(1),
    ///     city: Some(1),
    ///     password: Some("Secret123".into()),
    ///     confirm_password: Some("Secret123".into()),
    ///     ..Default::default()
    /// };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.username, "alice");
    /// assert!(user.password_hash.starts_with("$argon2"));
    /// ```
    #[instrument(skip(self, input), fields(username = ?input.username, email = ?input.email))]
    pub async fn register(&self, input: UserInput) -> Result<UserRecord, AccountError> {
        let validated = self.validate(input, None, false).await?;
        self.create(validated).await
    }

    /// Insert a validated user; the password is stored as an argon2 hash.
    pub async fn create(&self, validated: ValidatedUser) -> Result<UserRecord, AccountError> {
        let password = required(validated.password.filter(|p| !p.is_empty()), "password")?;
        let new = NewUser {
            username: required(validated.username, "username")?,
            first_name: validated.first_name.unwrap_or_default(),
            last_name: validated.last_name.unwrap_or_default(),
            email: required(validated.email, "email")?,
            gender: required(validated.gender, "gender")?,
            age: required(validated.age, "age")?,
            country_id: required(validated.country, "country")?,
            city_id: required(validated.city, "city")?,
            password_hash: hash_password(&password)?,
        };
        let user = self.repo.create_user(new).await?;
        info!(user_id = user.id, username = %user.username, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Apply validated changes to `user`.
    ///
    /// A new password requires `current_password`, must differ from it, and
    /// `current_password` must verify against the stored hash. Nothing is
    /// written when any of these fail.
    #[instrument(skip(self, user, validated), fields(user_id = user.id))]
    pub async fn update(&self, user: &UserRecord, validated: ValidatedUser) -> Result<UserRecord, AccountError> {
        let mut password_hash = None;
        if let Some(new_password) = non_empty(&validated.password) {
            let current = non_empty(&validated.current_password).ok_or(AccountError::MissingField {
                field: "current_password",
                message: messages::CURRENT_PASSWORD_REQUIRED,
            })?;
            if new_password == current {
                return Err(AccountError::SameValue);
            }
            if !verify_password(current, &user.password_hash)? {
                warn!(user_id = user.id, "current password rejected");
                return Err(AccountError::InvalidCredential {
                    field: "current_password",
                    message: messages::CURRENT_PASSWORD_INVALID,
                });
            }
            password_hash = Some(hash_password(new_password)?);
        }

        let password_changed = password_hash.is_some();
        let changes = UserChanges {
            username: validated.username,
            first_name: validated.first_name,
            last_name: validated.last_name,
            email: validated.email,
            gender: validated.gender,
            age: validated.age,
            country_id: validated.country,
            city_id: validated.city,
            password_hash,
        };
        let updated = self.repo.update_user(user.id, changes).await?;
        if password_changed {
            info!(user_id = updated.id, "password_changed");
        }
        info!(user_id = updated.id, "user_updated");
        Ok(updated)
    }

    /// Load the user, validate `input` against it and apply the update.
    /// `partial` selects PATCH semantics.
    pub async fn update_profile(&self, user_id: i32, input: UserInput, partial: bool) -> Result<UserRecord, AccountError> {
        let user = self.get_user(user_id).await?;
        let validated = self.validate(input, Some(&user), partial).await?;
        self.update(&user, validated).await
    }

    pub async fn get_user(&self, user_id: i32) -> Result<UserRecord, AccountError> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("user {user_id}")))
    }

    /// Exchange email and password for a new login token.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::account::{AccountConfig, AccountService, domain::{Gender, LoginInput, UserInput}};
    /// use service::account::repository::mock::MockAccountRepository;
    ///
    /// let repo = Arc::new(MockAccountRepository::default());
    /// repo.add_country(1, "Norway");
    /// repo.add_city(1, 1, "Oslo");
    /// let svc = AccountService::new(repo, AccountConfig::default());
    /// let input = UserInput {
    ///     username: Some("bob".into()),
    ///     email: Some("bob@x.com".into()),
    ///     gender: Some(Gender::Male),
    ///     age: Some(41),
    ///     country: Some(1),
    ///     city: Some(1),
    ///     password: Some("Passw0rd!x".into()),
    ///     confirm_password: Some("Passw0rd!x".into()),
    ///     ..Default::default()
    /// };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// let out = tokio_test::block_on(svc.login(LoginInput {
    ///     email: Some("bob@x.com".into()),
    ///     password: Some("Passw0rd!x".into()),
    /// }))
    /// .unwrap();
    /// assert_eq!(out.user_id, user.id);
    /// assert_eq!(out.token.len(), 64);
    /// ```
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AccountError> {
        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        require_fields(&mut errors, &[("email", input.email.is_some()), ("password", input.password.is_some())]);
        if input.password.as_deref() == Some("") {
            errors.add("password", messages::BLANK);
        }
        if !errors.is_empty() {
            return Err(AccountError::Invalid(errors));
        }
        let email = required(input.email, "email")?;
        let password = required(input.password, "password")?;

        let invalid = || AccountError::InvalidCredential { field: NON_FIELD_ERRORS, message: messages::INVALID_LOGIN };
        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            debug!("unknown email");
            return Err(invalid());
        };
        if !verify_password(&password, &user.password_hash)? {
            warn!(user_id = user.id, "login rejected");
            return Err(invalid());
        }
        if !user.is_active {
            warn!(user_id = user.id, "login on inactive account");
            return Err(AccountError::InactiveAccount);
        }

        let now = Utc::now();
        if let Some(limit) = self.cfg.token_limit_per_user {
            let mut live = 0usize;
            for token in self.repo.tokens_for_user(user.id).await? {
                if token.is_expired(now) {
                    self.repo.delete_token(token.id).await?;
                } else {
                    live += 1;
                }
            }
            if live >= limit {
                warn!(user_id = user.id, live, limit, "token limit reached");
                return Err(AccountError::TokenLimitExceeded);
            }
        }

        let (raw, record) = new_token(user.id, self.cfg.token_ttl, now)?;
        self.repo.insert_token(record).await?;
        self.repo.touch_last_login(user.id, now).await?;
        info!(user_id = user.id, "login_succeeded");
        Ok(LoginOutput { token: raw, user_id: user.id })
    }

    /// Resolve a presented token to its active user.
    ///
    /// Expired tokens are deleted on sight and rejected.
    #[instrument(skip_all)]
    pub async fn authenticate_token(&self, raw: &str) -> Result<Session, AccountError> {
        let key = token_key(raw).ok_or(AccountError::Unauthenticated(messages::INVALID_TOKEN))?;
        let digest = hash_token(raw);
        let now = Utc::now();

        for token in self.repo.tokens_by_key(key).await? {
            if !digests_match(&token.digest, &digest) {
                continue;
            }
            if token.is_expired(now) {
                self.repo.delete_token(token.id).await?;
                debug!(token_id = %token.id, "expired token removed");
                return Err(AccountError::Unauthenticated(messages::INVALID_TOKEN));
            }
            return match self.repo.get_user(token.user_id).await? {
                Some(user) if user.is_active => Ok(Session { user, token }),
                _ => Err(AccountError::Unauthenticated(messages::INACTIVE_TOKEN_USER)),
            };
        }
        Err(AccountError::Unauthenticated(messages::INVALID_TOKEN))
    }

    /// Revoke a single token.
    pub async fn logout(&self, token_id: Uuid) -> Result<(), AccountError> {
        if self.repo.delete_token(token_id).await? {
            info!(token_id = %token_id, "token_revoked");
        }
        Ok(())
    }

    /// Revoke every token of a user; returns how many were removed.
    pub async fn logout_all(&self, user_id: i32) -> Result<u64, AccountError> {
        let removed = self.repo.delete_tokens_for_user(user_id).await?;
        info!(user_id, removed, "token_revoked");
        Ok(removed)
    }

    pub async fn list_countries(&self) -> Result<Vec<CountryView>, AccountError> {
        let rows = self.repo.list_countries().await?;
        Ok(rows.into_iter().map(|(country, cities)| CountryView::from_records(country, cities)).collect())
    }

    pub async fn get_country(&self, id: i32) -> Result<CountryView, AccountError> {
        self.repo
            .country_with_cities(id)
            .await?
            .map(|(country, cities)| CountryView::from_records(country, cities))
            .ok_or_else(|| AccountError::NotFound(format!("country {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::domain::Gender;
    use crate::account::repository::mock::MockAccountRepository;
    use crate::test_support::{registration, seeded_repo, service};

    async fn registered(svc: &AccountService<MockAccountRepository>, name: &str) -> UserRecord {
        svc.register(registration(name, &format!("{name}@x.com"))).await.unwrap()
    }

    fn payload(err: &AccountError) -> FieldErrors {
        err.field_errors().expect("field payload")
    }

    #[tokio::test]
    async fn register_returns_user_without_password() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        let user = svc.register(registration("alice", "a@x.com")).await.unwrap();
        assert!(user.id > 0);
        assert_ne!(user.password_hash, "Secret123");
        assert!(verify_password("Secret123", &user.password_hash).unwrap());

        let json = serde_json::to_value(crate::account::domain::UserView::from(&user)).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("password").is_none());
        assert!(json.get("confirm_password").is_none());
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn confirm_password_mismatch_persists_nothing() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        let mut input = registration("alice", "a@x.com");
        input.confirm_password = Some("Other".into());
        let err = svc.register(input).await.unwrap_err();
        assert!(matches!(err, AccountError::Mismatch));
        assert_eq!(payload(&err).get("confirm_password").unwrap(), &[messages::PASSWORDS_MISMATCH.to_string()]);
        assert_eq!(repo.user_count(), 0);
    }

    #[tokio::test]
    async fn missing_confirm_password_persists_nothing() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        for confirm in [None, Some(String::new())] {
            let mut input = registration("alice", "a@x.com");
            input.confirm_password = confirm;
            let err = svc.register(input).await.unwrap_err();
            assert_eq!(payload(&err).get(NON_FIELD_ERRORS).unwrap(), &[messages::PASSWORDS_REQUIRED.to_string()]);
        }
        assert_eq!(repo.user_count(), 0);
    }

    #[tokio::test]
    async fn username_and_email_must_be_unique() {
        let svc = service(seeded_repo());
        registered(&svc, "alice").await;

        let err = svc.register(registration("alice", "other@x.com")).await.unwrap_err();
        assert_eq!(payload(&err).get("username").unwrap(), &["A user with that username already exists.".to_string()]);

        let err = svc.register(registration("bob", "alice@x.com")).await.unwrap_err();
        assert!(matches!(err, AccountError::Uniqueness { field: "email" }));
    }

    #[tokio::test]
    async fn inactive_holder_does_not_block_validation_but_storage_does() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        let alice = registered(&svc, "alice").await;
        repo.set_active(alice.id, false);
        let err = svc.register(registration("alice", "new@x.com")).await.unwrap_err();
        assert!(matches!(err, AccountError::Conflict(_)));
    }

    #[tokio::test]
    async fn city_must_belong_to_country() {
        let svc = service(seeded_repo());
        let mut input = registration("alice", "a@x.com");
        input.country = Some(2);
        input.city = Some(1);
        let err = svc.register(input).await.unwrap_err();
        assert!(matches!(err, AccountError::Relationship));
        assert_eq!(payload(&err).get(NON_FIELD_ERRORS).unwrap(), &[messages::CITY_NOT_IN_COUNTRY.to_string()]);
    }

    #[tokio::test]
    async fn unknown_country_is_a_field_error() {
        let svc = service(seeded_repo());
        let mut input = registration("alice", "a@x.com");
        input.country = Some(99);
        let err = svc.register(input).await.unwrap_err();
        assert_eq!(payload(&err).get("country").unwrap(), &["Invalid pk \"99\" - object does not exist.".to_string()]);
    }

    #[tokio::test]
    async fn field_errors_are_reported_together() {
        let svc = service(seeded_repo());
        let input = UserInput { username: Some("bad name".into()), password: Some("123".into()), ..Default::default() };
        let err = svc.register(input).await.unwrap_err();
        let errors = payload(&err);
        for field in ["username", "email", "gender", "age", "country", "city", "password"] {
            assert!(errors.contains(field), "missing {field}");
        }
        assert!(!errors.contains(NON_FIELD_ERRORS));
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let svc = service(seeded_repo());
        let mut input = registration("alice", "a@x.com");
        input.password = Some("12345678".into());
        input.confirm_password = Some("12345678".into());
        let err = svc.register(input).await.unwrap_err();
        assert!(payload(&err).get("password").unwrap().contains(&"This password is entirely numeric.".to_string()));
    }

    #[tokio::test]
    async fn password_change_requires_current_password() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;

        let input = UserInput { password: Some("NewSecret456".into()), ..Default::default() };
        let err = svc.update_profile(alice.id, input, true).await.unwrap_err();
        assert_eq!(payload(&err).get("current_password").unwrap(), &[messages::CURRENT_PASSWORD_REQUIRED.to_string()]);

        let stored = svc.get_user(alice.id).await.unwrap();
        assert_eq!(stored.password_hash, alice.password_hash);
    }

    #[tokio::test]
    async fn wrong_current_password_never_mutates() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;

        let input = UserInput {
            first_name: Some("Changed".into()),
            password: Some("NewSecret456".into()),
            current_password: Some("WrongOne99".into()),
            ..Default::default()
        };
        let err = svc.update_profile(alice.id, input, true).await.unwrap_err();
        assert_eq!(payload(&err).get("current_password").unwrap(), &["Current password is invalid".to_string()]);

        let stored = svc.get_user(alice.id).await.unwrap();
        assert_eq!(stored, alice);
    }

    #[tokio::test]
    async fn new_password_must_differ() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;
        let input = UserInput {
            password: Some("Secret123".into()),
            current_password: Some("Secret123".into()),
            ..Default::default()
        };
        let err = svc.update_profile(alice.id, input, true).await.unwrap_err();
        assert!(matches!(err, AccountError::SameValue));
        assert_eq!(payload(&err).get("password").unwrap(), &[messages::SAME_PASSWORD.to_string()]);
    }

    #[tokio::test]
    async fn password_change_succeeds() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;
        let input = UserInput {
            password: Some("NewSecret456".into()),
            confirm_password: Some("NewSecret456".into()),
            current_password: Some("Secret123".into()),
            ..Default::default()
        };
        let updated = svc.update_profile(alice.id, input, true).await.unwrap();
        assert!(verify_password("NewSecret456", &updated.password_hash).unwrap());
        assert!(!verify_password("Secret123", &updated.password_hash).unwrap());
    }

    #[tokio::test]
    async fn update_with_mismatched_confirmation_fails() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;
        let input = UserInput {
            password: Some("NewSecret456".into()),
            confirm_password: Some("Different789".into()),
            current_password: Some("Secret123".into()),
            ..Default::default()
        };
        assert!(matches!(svc.update_profile(alice.id, input, true).await, Err(AccountError::Mismatch)));
    }

    #[tokio::test]
    async fn first_name_change_needs_no_current_password() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;
        let input = UserInput { first_name: Some("Alicia".into()), ..Default::default() };
        let updated = svc.update_profile(alice.id, input, true).await.unwrap();
        assert_eq!(updated.first_name, "Alicia");
        assert_eq!(updated.password_hash, alice.password_hash);
    }

    #[tokio::test]
    async fn partial_update_uses_stored_country() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;

        let ok = svc.update_profile(alice.id, UserInput { city: Some(2), ..Default::default() }, true).await.unwrap();
        assert_eq!(ok.city_id, 2);

        let err = svc.update_profile(alice.id, UserInput { city: Some(3), ..Default::default() }, true).await.unwrap_err();
        assert!(matches!(err, AccountError::Relationship));
    }

    #[tokio::test]
    async fn full_update_requires_profile_fields() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;
        let err = svc
            .update_profile(alice.id, UserInput { first_name: Some("A".into()), ..Default::default() }, false)
            .await
            .unwrap_err();
        assert!(payload(&err).contains("username"));

        let mut full = registration("alice", "alice@x.com");
        full.password = None;
        full.confirm_password = None;
        full.gender = Some(Gender::Other);
        let updated = svc.update_profile(alice.id, full, false).await.unwrap();
        assert_eq!(updated.gender, Gender::Other);
    }

    #[tokio::test]
    async fn keeping_own_username_is_not_a_conflict() {
        let svc = service(seeded_repo());
        let alice = registered(&svc, "alice").await;
        let input = UserInput { username: Some("alice".into()), email: Some("alice@x.com".into()), ..Default::default() };
        assert!(svc.update_profile(alice.id, input, true).await.is_ok());
    }

    #[tokio::test]
    async fn login_issues_token_and_records_last_login() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        let alice = registered(&svc, "alice").await;

        let out = svc
            .login(LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) })
            .await
            .unwrap();
        assert_eq!(out.user_id, alice.id);

        let stored = repo.all_tokens();
        assert_eq!(stored.len(), 1);
        assert_ne!(stored[0].digest, out.token);
        assert_eq!(stored[0].digest, hash_token(&out.token));
        assert!(svc.get_user(alice.id).await.unwrap().last_login.is_some());

        let session = svc.authenticate_token(&out.token).await.unwrap();
        assert_eq!(session.user.id, alice.id);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let svc = service(seeded_repo());
        registered(&svc, "alice").await;
        for (email, password) in [("alice@x.com", "nope-nope"), ("ghost@x.com", "Secret123")] {
            let err = svc
                .login(LoginInput { email: Some(email.into()), password: Some(password.into()) })
                .await
                .unwrap_err();
            assert_eq!(payload(&err).get(NON_FIELD_ERRORS).unwrap(), &[messages::INVALID_LOGIN.to_string()]);
        }
        let err = svc.login(LoginInput::default()).await.unwrap_err();
        assert!(payload(&err).contains("email"));
        assert!(payload(&err).contains("password"));
    }

    #[tokio::test]
    async fn login_on_inactive_account() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        let alice = registered(&svc, "alice").await;
        repo.set_active(alice.id, false);
        let err = svc
            .login(LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InactiveAccount));
        assert_eq!(payload(&err).get(NON_FIELD_ERRORS).unwrap(), &[messages::INACTIVE_ACCOUNT.to_string()]);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_and_removed() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        registered(&svc, "alice").await;
        let out = svc
            .login(LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) })
            .await
            .unwrap();

        let mut token = repo.all_tokens().remove(0);
        token.expiry = Some(Utc::now() - Duration::seconds(1));
        repo.replace_token(token);

        let err = svc.authenticate_token(&out.token).await.unwrap_err();
        assert!(matches!(err, AccountError::Unauthenticated(messages::INVALID_TOKEN)));
        assert_eq!(repo.token_count(), 0);
    }

    #[tokio::test]
    async fn tokens_of_inactive_users_are_rejected() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        let alice = registered(&svc, "alice").await;
        let out = svc
            .login(LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) })
            .await
            .unwrap();
        repo.set_active(alice.id, false);
        let err = svc.authenticate_token(&out.token).await.unwrap_err();
        assert!(matches!(err, AccountError::Unauthenticated(messages::INACTIVE_TOKEN_USER)));
        assert!(svc.authenticate_token("garbage").await.is_err());
    }

    #[tokio::test]
    async fn logout_and_logout_all() {
        let repo = seeded_repo();
        let svc = service(repo.clone());
        let alice = registered(&svc, "alice").await;
        let login = || LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) };
        let first = svc.login(login()).await.unwrap();
        let second = svc.login(login()).await.unwrap();

        let session = svc.authenticate_token(&first.token).await.unwrap();
        svc.logout(session.token.id).await.unwrap();
        assert!(svc.authenticate_token(&first.token).await.is_err());
        assert!(svc.authenticate_token(&second.token).await.is_ok());

        svc.login(login()).await.unwrap();
        assert_eq!(svc.logout_all(alice.id).await.unwrap(), 2);
        assert!(svc.authenticate_token(&second.token).await.is_err());
    }

    #[tokio::test]
    async fn token_limit_per_user() {
        let repo = seeded_repo();
        let cfg = AccountConfig { token_limit_per_user: Some(1), ..AccountConfig::default() };
        let svc = AccountService::new(repo.clone(), cfg);
        registered(&svc, "alice").await;
        let login = || LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) };
        svc.login(login()).await.unwrap();
        assert!(matches!(svc.login(login()).await, Err(AccountError::TokenLimitExceeded)));
    }

    #[tokio::test]
    async fn countries_project_with_cities() {
        let svc = service(seeded_repo());
        let all = svc.list_countries().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].cities.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(svc.get_country(2).await.unwrap().cities[0].name, "Stockholm");
        assert!(matches!(svc.get_country(42).await, Err(AccountError::NotFound(_))));
    }

    #[test]
    fn config_from_settings() {
        let mut settings = configs::AuthSettings::default();
        assert_eq!(AccountConfig::from_settings(&settings).token_ttl, Some(Duration::hours(10)));
        settings.token_ttl_secs = 0;
        settings.password_min_length = 12;
        let cfg = AccountConfig::from_settings(&settings);
        assert!(cfg.token_ttl.is_none());
        assert_eq!(cfg.password_policy.min_length, 12);

        settings.token_ttl_secs = u64::MAX;
        let cfg = AccountConfig::from_settings(&settings);
        assert_eq!(cfg.token_ttl, Some(Duration::seconds(configs::MAX_TOKEN_TTL_SECS as i64)));
    }

    #[tokio::test]
    async fn longest_configured_ttl_still_logs_in() {
        let mut settings = configs::AuthSettings::default();
        settings.token_ttl_secs = 10_000_000_000_000;
        let svc = AccountService::new(seeded_repo(), AccountConfig::from_settings(&settings));
        registered(&svc, "alice").await;
        let login = LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) };
        let out = svc.login(login).await.unwrap();
        assert!(svc.authenticate_token(&out.token).await.is_ok());
    }

    #[tokio::test]
    async fn unrepresentable_ttl_fails_login_without_a_token() {
        let repo = seeded_repo();
        let cfg = AccountConfig { token_ttl: Some(Duration::days(365 * 1_000_000)), ..AccountConfig::default() };
        let svc = AccountService::new(repo.clone(), cfg);
        registered(&svc, "alice").await;
        let login = LoginInput { email: Some("alice@x.com".into()), password: Some("Secret123".into()) };
        assert!(matches!(svc.login(login).await, Err(AccountError::TokenLifetime)));
        assert_eq!(repo.token_count(), 0);
    }
}
