use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, ColumnTrait, QueryFilter, ActiveModelTrait, Set, DatabaseConnection};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::user;

/// Issued login token. Only the digest is stored; `token_key` is the
/// plaintext prefix used to narrow the lookup.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: i32,
    pub token_key: String,
    #[serde(skip_serializing)]
    pub digest: String,
    pub created_at: DateTimeWithTimeZone,
    pub expiry: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn insert(db: &DatabaseConnection, token: Model) -> Result<Model, crate::errors::ModelError> {
    if token.digest.trim().is_empty() {
        return Err(crate::errors::ModelError::Validation("token digest required".into()));
    }
    let am = ActiveModel {
        id: Set(token.id),
        user_id: Set(token.user_id),
        token_key: Set(token.token_key),
        digest: Set(token.digest),
        created_at: Set(token.created_at),
        expiry: Set(token.expiry),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_key(db: &DatabaseConnection, token_key: &str) -> Result<Vec<Model>, crate::errors::ModelError> {
    Ok(Entity::find().filter(Column::TokenKey.eq(token_key)).all(db).await?)
}

pub async fn find_by_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<Model>, crate::errors::ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).all(db).await?)
}

pub async fn delete_for_user(db: &DatabaseConnection, user_id: i32) -> Result<u64, crate::errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
