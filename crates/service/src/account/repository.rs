use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{CityRecord, CountryRecord, NewUser, TokenRecord, UserChanges, UserRecord};
use super::errors::AccountError;

/// Persistence needed by the account workflows.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_user(&self, id: i32) -> Result<Option<UserRecord>, AccountError>;
    async fn find_active_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError>;
    async fn find_active_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AccountError>;
    /// Any user with that email, active or not.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AccountError>;
    async fn create_user(&self, new: NewUser) -> Result<UserRecord, AccountError>;
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<UserRecord, AccountError>;
    async fn touch_last_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), AccountError>;

    async fn get_country(&self, id: i32) -> Result<Option<CountryRecord>, AccountError>;
    async fn get_city(&self, id: i32) -> Result<Option<CityRecord>, AccountError>;
    async fn list_countries(&self) -> Result<Vec<(CountryRecord, Vec<CityRecord>)>, AccountError>;
    async fn country_with_cities(&self, id: i32) -> Result<Option<(CountryRecord, Vec<CityRecord>)>, AccountError>;

    async fn insert_token(&self, token: TokenRecord) -> Result<TokenRecord, AccountError>;
    async fn tokens_by_key(&self, token_key: &str) -> Result<Vec<TokenRecord>, AccountError>;
    async fn tokens_for_user(&self, user_id: i32) -> Result<Vec<TokenRecord>, AccountError>;
    /// `true` when a row was removed.
    async fn delete_token(&self, id: Uuid) -> Result<bool, AccountError>;
    async fn delete_tokens_for_user(&self, user_id: i32) -> Result<u64, AccountError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    struct State {
        users: BTreeMap<i32, UserRecord>,
        countries: BTreeMap<i32, CountryRecord>,
        cities: BTreeMap<i32, CityRecord>,
        tokens: HashMap<Uuid, TokenRecord>,
        next_user_id: i32,
    }

    /// Mirrors the storage constraints: username and email are unique
    /// across all rows, active or not.
    #[derive(Default)]
    pub struct MockAccountRepository {
        state: Mutex<State>,
    }

    impl MockAccountRepository {
        fn state(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        pub fn add_country(&self, id: i32, name: &str) {
            self.state().countries.insert(id, CountryRecord { id, name: name.to_string() });
        }

        pub fn add_city(&self, id: i32, country_id: i32, name: &str) {
            self.state().cities.insert(id, CityRecord { id, name: name.to_string(), country_id });
        }

        pub fn set_active(&self, user_id: i32, active: bool) {
            if let Some(u) = self.state().users.get_mut(&user_id) {
                u.is_active = active;
            }
        }

        /// Overwrite a stored token, e.g. to move its expiry into the past.
        pub fn replace_token(&self, token: TokenRecord) {
            self.state().tokens.insert(token.id, token);
        }

        pub fn user_count(&self) -> usize { self.state().users.len() }

        pub fn token_count(&self) -> usize { self.state().tokens.len() }

        pub fn all_tokens(&self) -> Vec<TokenRecord> { self.state().tokens.values().cloned().collect() }
    }

    fn check_unique(state: &State, skip: Option<i32>, username: &str, email: &str) -> Result<(), AccountError> {
        for u in state.users.values().filter(|u| Some(u.id) != skip) {
            if u.username == username {
                return Err(AccountError::Conflict(format!("duplicate username {username}")));
            }
            if u.email == email {
                return Err(AccountError::Conflict(format!("duplicate email {email}")));
            }
        }
        Ok(())
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn get_user(&self, id: i32) -> Result<Option<UserRecord>, AccountError> {
            Ok(self.state().users.get(&id).cloned())
        }

        async fn find_active_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError> {
            Ok(self.state().users.values().find(|u| u.is_active && u.username == username).cloned())
        }

        async fn find_active_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AccountError> {
            Ok(self.state().users.values().find(|u| u.is_active && u.email == email).cloned())
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AccountError> {
            Ok(self.state().users.values().find(|u| u.email == email).cloned())
        }

        async fn create_user(&self, new: NewUser) -> Result<UserRecord, AccountError> {
            let mut state = self.state();
            check_unique(&state, None, &new.username, &new.email)?;
            state.next_user_id += 1;
            let user = UserRecord {
                id: state.next_user_id,
                username: new.username,
                first_name: new.first_name,
                last_name: new.last_name,
                email: new.email,
                gender: new.gender,
                age: new.age,
                country_id: new.country_id,
                city_id: new.city_id,
                password_hash: new.password_hash,
                is_active: true,
                date_joined: Utc::now(),
                last_login: None,
            };
            state.users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update_user(&self, id: i32, changes: UserChanges) -> Result<UserRecord, AccountError> {
            let mut state = self.state();
            let mut user = state
                .users
                .get(&id)
                .cloned()
                .ok_or_else(|| AccountError::NotFound(format!("user {id}")))?;
            if let Some(v) = changes.username { user.username = v; }
            if let Some(v) = changes.first_name { user.first_name = v; }
            if let Some(v) = changes.last_name { user.last_name = v; }
            if let Some(v) = changes.email { user.email = v; }
            if let Some(v) = changes.gender { user.gender = v; }
            if let Some(v) = changes.age { user.age = v; }
            if let Some(v) = changes.country_id { user.country_id = v; }
            if let Some(v) = changes.city_id { user.city_id = v; }
            if let Some(v) = changes.password_hash { user.password_hash = v; }
            check_unique(&state, Some(id), &user.username, &user.email)?;
            state.users.insert(id, user.clone());
            Ok(user)
        }

        async fn touch_last_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), AccountError> {
            match self.state().users.get_mut(&id) {
                Some(u) => {
                    u.last_login = Some(at);
                    Ok(())
                }
                None => Err(AccountError::NotFound(format!("user {id}"))),
            }
        }

        async fn get_country(&self, id: i32) -> Result<Option<CountryRecord>, AccountError> {
            Ok(self.state().countries.get(&id).cloned())
        }

        async fn get_city(&self, id: i32) -> Result<Option<CityRecord>, AccountError> {
            Ok(self.state().cities.get(&id).cloned())
        }

        async fn list_countries(&self) -> Result<Vec<(CountryRecord, Vec<CityRecord>)>, AccountError> {
            let state = self.state();
            Ok(state
                .countries
                .values()
                .map(|c| {
                    let cities = state.cities.values().filter(|city| city.country_id == c.id).cloned().collect();
                    (c.clone(), cities)
                })
                .collect())
        }

        async fn country_with_cities(&self, id: i32) -> Result<Option<(CountryRecord, Vec<CityRecord>)>, AccountError> {
            let state = self.state();
            Ok(state.countries.get(&id).map(|c| {
                let cities = state.cities.values().filter(|city| city.country_id == id).cloned().collect();
                (c.clone(), cities)
            }))
        }

        async fn insert_token(&self, token: TokenRecord) -> Result<TokenRecord, AccountError> {
            let mut state = self.state();
            if state.tokens.values().any(|t| t.digest == token.digest) {
                return Err(AccountError::Conflict("duplicate token digest".into()));
            }
            state.tokens.insert(token.id, token.clone());
            Ok(token)
        }

        async fn tokens_by_key(&self, token_key: &str) -> Result<Vec<TokenRecord>, AccountError> {
            Ok(self.state().tokens.values().filter(|t| t.token_key == token_key).cloned().collect())
        }

        async fn tokens_for_user(&self, user_id: i32) -> Result<Vec<TokenRecord>, AccountError> {
            let mut tokens: Vec<TokenRecord> =
                self.state().tokens.values().filter(|t| t.user_id == user_id).cloned().collect();
            tokens.sort_by_key(|t| t.created_at);
            Ok(tokens)
        }

        async fn delete_token(&self, id: Uuid) -> Result<bool, AccountError> {
            Ok(self.state().tokens.remove(&id).is_some())
        }

        async fn delete_tokens_for_user(&self, user_id: i32) -> Result<u64, AccountError> {
            let mut state = self.state();
            let before = state.tokens.len();
            state.tokens.retain(|_, t| t.user_id != user_id);
            Ok((before - state.tokens.len()) as u64)
        }
    }
}
