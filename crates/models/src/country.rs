use sea_orm::{entity::prelude::*, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::{city, errors};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "country")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    City,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::City => Entity::has_many(city::Entity).into(),
        }
    }
}

impl Related<city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::City.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("country name required".into())); }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, name: &str) -> Result<Model, errors::ModelError> {
    validate_name(name)?;
    let am = ActiveModel { name: Set(name.trim().to_string()), ..Default::default() };
    Ok(am.insert(db).await?)
}

/// A country together with its cities, both ordered by id.
pub async fn find_with_cities(db: &DatabaseConnection, id: i32) -> Result<Option<(Model, Vec<city::Model>)>, errors::ModelError> {
    let Some(country) = Entity::find_by_id(id).one(db).await? else { return Ok(None) };
    let cities = country
        .find_related(city::Entity)
        .order_by_asc(city::Column::Id)
        .all(db)
        .await?;
    Ok(Some((country, cities)))
}

pub async fn list_with_cities(db: &DatabaseConnection) -> Result<Vec<(Model, Vec<city::Model>)>, errors::ModelError> {
    let mut rows = Entity::find()
        .order_by_asc(Column::Id)
        .find_with_related(city::Entity)
        .all(db)
        .await?;
    for (_, cities) in rows.iter_mut() {
        cities.sort_by_key(|c| c.id);
    }
    Ok(rows)
}
