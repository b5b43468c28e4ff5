//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_country;
mod m20240301_000002_create_city;
mod m20240301_000003_create_user;
mod m20240301_000004_create_auth_token;
mod m20240301_000010_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_country::Migration),
            Box::new(m20240301_000002_create_city::Migration),
            Box::new(m20240301_000003_create_user::Migration),
            Box::new(m20240301_000004_create_auth_token::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000010_add_indexes::Migration),
        ]
    }
}
