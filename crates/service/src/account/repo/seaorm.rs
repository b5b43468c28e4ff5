use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::account::domain::{CityRecord, CountryRecord, Gender, NewUser, TokenRecord, UserChanges, UserRecord};
use crate::account::errors::AccountError;
use crate::account::repository::AccountRepository;

pub struct SeaOrmAccountRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn db_err(e: sea_orm::DbErr) -> AccountError {
    AccountError::from(models::errors::ModelError::from(e))
}

fn to_user(m: models::user::Model) -> Result<UserRecord, AccountError> {
    let gender: Gender = m
        .gender
        .parse()
        .map_err(|e: String| AccountError::Repository(format!("user {}: {}", m.id, e)))?;
    Ok(UserRecord {
        id: m.id,
        username: m.username,
        first_name: m.first_name,
        last_name: m.last_name,
        email: m.email,
        gender,
        age: m.age,
        country_id: m.country_id,
        city_id: m.city_id,
        password_hash: m.password_hash,
        is_active: m.is_active,
        date_joined: m.date_joined.with_timezone(&Utc),
        last_login: m.last_login.map(|t| t.with_timezone(&Utc)),
    })
}

fn to_country(m: models::country::Model) -> CountryRecord {
    CountryRecord { id: m.id, name: m.name }
}

fn to_city(m: models::city::Model) -> CityRecord {
    CityRecord { id: m.id, name: m.name, country_id: m.country_id }
}

fn to_token(m: models::auth_token::Model) -> TokenRecord {
    TokenRecord {
        id: m.id,
        user_id: m.user_id,
        token_key: m.token_key,
        digest: m.digest,
        created_at: m.created_at.with_timezone(&Utc),
        expiry: m.expiry.map(|t| t.with_timezone(&Utc)),
    }
}

fn opt_user(m: Option<models::user::Model>) -> Result<Option<UserRecord>, AccountError> {
    m.map(to_user).transpose()
}

#[async_trait::async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn get_user(&self, id: i32) -> Result<Option<UserRecord>, AccountError> {
        let res = models::user::Entity::find_by_id(id).one(&self.db).await.map_err(db_err)?;
        opt_user(res)
    }

    async fn find_active_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError> {
        opt_user(models::user::find_active_by_username(&self.db, username).await?)
    }

    async fn find_active_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AccountError> {
        opt_user(models::user::find_active_by_email(&self.db, email).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AccountError> {
        opt_user(models::user::find_by_email(&self.db, email).await?)
    }

    async fn create_user(&self, new: NewUser) -> Result<UserRecord, AccountError> {
        let created = models::user::create(
            &self.db,
            models::user::NewUser {
                username: new.username,
                first_name: new.first_name,
                last_name: new.last_name,
                email: new.email,
                gender: new.gender.as_str().to_string(),
                age: new.age,
                country_id: new.country_id,
                city_id: new.city_id,
                password_hash: new.password_hash,
            },
        )
        .await?;
        to_user(created)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<UserRecord, AccountError> {
        if self.get_user(id).await?.is_none() {
            return Err(AccountError::NotFound(format!("user {id}")));
        }
        let patch = models::user::UserPatch {
            username: changes.username,
            first_name: changes.first_name,
            last_name: changes.last_name,
            email: changes.email,
            gender: changes.gender.map(|g| g.as_str().to_string()),
            age: changes.age,
            country_id: changes.country_id,
            city_id: changes.city_id,
            password_hash: changes.password_hash,
        };
        to_user(models::user::apply_patch(&self.db, id, patch).await?)
    }

    async fn touch_last_login(&self, id: i32, at: DateTime<Utc>) -> Result<(), AccountError> {
        models::user::set_last_login(&self.db, id, at.into()).await?;
        Ok(())
    }

    async fn get_country(&self, id: i32) -> Result<Option<CountryRecord>, AccountError> {
        let res = models::country::Entity::find_by_id(id).one(&self.db).await.map_err(db_err)?;
        Ok(res.map(to_country))
    }

    async fn get_city(&self, id: i32) -> Result<Option<CityRecord>, AccountError> {
        let res = models::city::Entity::find_by_id(id).one(&self.db).await.map_err(db_err)?;
        Ok(res.map(to_city))
    }

    async fn list_countries(&self) -> Result<Vec<(CountryRecord, Vec<CityRecord>)>, AccountError> {
        let rows = models::country::list_with_cities(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|(c, cities)| (to_country(c), cities.into_iter().map(to_city).collect()))
            .collect())
    }

    async fn country_with_cities(&self, id: i32) -> Result<Option<(CountryRecord, Vec<CityRecord>)>, AccountError> {
        let row = models::country::find_with_cities(&self.db, id).await?;
        Ok(row.map(|(c, cities)| (to_country(c), cities.into_iter().map(to_city).collect())))
    }

    async fn insert_token(&self, token: TokenRecord) -> Result<TokenRecord, AccountError> {
        let saved = models::auth_token::insert(
            &self.db,
            models::auth_token::Model {
                id: token.id,
                user_id: token.user_id,
                token_key: token.token_key,
                digest: token.digest,
                created_at: token.created_at.into(),
                expiry: token.expiry.map(Into::into),
            },
        )
        .await?;
        Ok(to_token(saved))
    }

    async fn tokens_by_key(&self, token_key: &str) -> Result<Vec<TokenRecord>, AccountError> {
        Ok(models::auth_token::find_by_key(&self.db, token_key).await?.into_iter().map(to_token).collect())
    }

    async fn tokens_for_user(&self, user_id: i32) -> Result<Vec<TokenRecord>, AccountError> {
        let mut tokens: Vec<TokenRecord> =
            models::auth_token::find_by_user(&self.db, user_id).await?.into_iter().map(to_token).collect();
        tokens.sort_by_key(|t| t.created_at);
        Ok(tokens)
    }

    async fn delete_token(&self, id: Uuid) -> Result<bool, AccountError> {
        let res = models::auth_token::Entity::delete_by_id(id).exec(&self.db).await.map_err(db_err)?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_tokens_for_user(&self, user_id: i32) -> Result<u64, AccountError> {
        Ok(models::auth_token::delete_for_user(&self.db, user_id).await?)
    }
}
