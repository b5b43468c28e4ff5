//! Create `user` table with FKs to `country` and `city`.
//!
//! Username and email carry unique constraints; the service checks them first
//! and the constraint catches concurrent registrations.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id))
                    .col(string_len(User::Username, 150).unique_key().not_null())
                    .col(string_len(User::FirstName, 150).not_null())
                    .col(string_len(User::LastName, 150).not_null())
                    .col(string_len(User::Email, 254).unique_key().not_null())
                    .col(string_len(User::Gender, 16).not_null())
                    .col(integer(User::Age).not_null())
                    .col(integer(User::CountryId).not_null())
                    .col(integer(User::CityId).not_null())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(boolean(User::IsActive).default(true).not_null())
                    .col(timestamp_with_time_zone(User::DateJoined).not_null())
                    .col(
                        ColumnDef::new(User::LastLogin)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_country")
                            .from(User::Table, User::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_city")
                            .from(User::Table, User::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Username,
    FirstName,
    LastName,
    Email,
    Gender,
    Age,
    CountryId,
    CityId,
    PasswordHash,
    IsActive,
    DateJoined,
    LastLogin,
}

#[derive(DeriveIden)]
enum Country { Table, Id }

#[derive(DeriveIden)]
enum City { Table, Id }
