use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::{auth_token, city, country};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub gender: String,
    pub age: i32,
    pub country_id: i32,
    pub city_id: i32,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: DateTimeWithTimeZone,
    pub last_login: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Country,
    City,
    AuthToken,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Country => Entity::belongs_to(country::Entity).from(Column::CountryId).to(country::Column::Id).into(),
            Relation::City => Entity::belongs_to(city::Entity).from(Column::CityId).to(city::Column::Id).into(),
            Relation::AuthToken => Entity::has_many(auth_token::Entity).into(),
        }
    }
}

impl Related<auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Column values for a new user; the password arrives already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub age: i32,
    pub country_id: i32,
    pub city_id: i32,
    pub password_hash: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Clone, Debug, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub country_id: Option<i32>,
    pub city_id: Option<i32>,
    pub password_hash: Option<String>,
}

pub async fn create(db: &DatabaseConnection, new: NewUser) -> Result<Model, errors::ModelError> {
    if !new.email.contains('@') { return Err(errors::ModelError::Validation("invalid email".into())); }
    if new.username.trim().is_empty() { return Err(errors::ModelError::Validation("username required".into())); }
    if new.password_hash.trim().is_empty() { return Err(errors::ModelError::Validation("password hash required".into())); }
    let am = ActiveModel {
        username: Set(new.username),
        first_name: Set(new.first_name),
        last_name: Set(new.last_name),
        email: Set(new.email),
        gender: Set(new.gender),
        age: Set(new.age),
        country_id: Set(new.country_id),
        city_id: Set(new.city_id),
        password_hash: Set(new.password_hash),
        is_active: Set(true),
        date_joined: Set(Utc::now().into()),
        last_login: Set(None),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

pub async fn apply_patch(db: &DatabaseConnection, id: i32, patch: UserPatch) -> Result<Model, errors::ModelError> {
    let found = Entity::find_by_id(id).one(db).await?
        .ok_or_else(|| errors::ModelError::Validation("user not found".into()))?;
    let mut am: ActiveModel = found.into();
    if let Some(v) = patch.username { am.username = Set(v); }
    if let Some(v) = patch.first_name { am.first_name = Set(v); }
    if let Some(v) = patch.last_name { am.last_name = Set(v); }
    if let Some(v) = patch.email { am.email = Set(v); }
    if let Some(v) = patch.gender { am.gender = Set(v); }
    if let Some(v) = patch.age { am.age = Set(v); }
    if let Some(v) = patch.country_id { am.country_id = Set(v); }
    if let Some(v) = patch.city_id { am.city_id = Set(v); }
    if let Some(v) = patch.password_hash { am.password_hash = Set(v); }
    Ok(am.update(db).await?)
}

pub async fn find_active_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find()
        .filter(Column::Username.eq(username))
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await?)
}

pub async fn find_active_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .filter(Column::IsActive.eq(true))
        .one(db)
        .await?)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

pub async fn set_last_login(db: &DatabaseConnection, id: i32, at: DateTimeWithTimeZone) -> Result<(), errors::ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id).one(db).await?
        .ok_or_else(|| errors::ModelError::Validation("user not found".into()))?
        .into();
    found.last_login = Set(Some(at));
    found.update(db).await?;
    Ok(())
}

pub async fn set_active(db: &DatabaseConnection, id: i32, active: bool) -> Result<(), errors::ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id).one(db).await?
        .ok_or_else(|| errors::ModelError::Validation("user not found".into()))?
        .into();
    found.is_active = Set(active);
    found.update(db).await?;
    Ok(())
}
