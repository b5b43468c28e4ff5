use sea_orm::{entity::prelude::*, DatabaseConnection, PaginatorTrait, Set};
use serde::{Deserialize, Serialize};

use crate::{country, errors};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub country_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Country,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Country => Entity::belongs_to(country::Entity)
                .from(Column::CountryId)
                .to(country::Column::Id)
                .into(),
        }
    }
}

impl Related<country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, country_id: i32, name: &str) -> Result<Model, errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("city name required".into())); }
    let am = ActiveModel {
        name: Set(name.trim().to_string()),
        country_id: Set(country_id),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}

/// Whether `city_id` is one of the cities owned by `country_id`.
pub async fn belongs_to_country(db: &DatabaseConnection, city_id: i32, country_id: i32) -> Result<bool, errors::ModelError> {
    let count = Entity::find_by_id(city_id)
        .filter(Column::CountryId.eq(country_id))
        .count(db)
        .await?;
    Ok(count > 0)
}
