use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // City: lookups by country when projecting a country with its cities
        manager
            .create_index(
                Index::create()
                    .name("idx_city_country")
                    .table(City::Table)
                    .col(City::CountryId)
                    .to_owned(),
            )
            .await?;

        // AuthToken: prefix lookup on every authenticated request
        manager
            .create_index(
                Index::create()
                    .name("idx_auth_token_key")
                    .table(AuthToken::Table)
                    .col(AuthToken::TokenKey)
                    .to_owned(),
            )
            .await?;

        // AuthToken: logout-all and per-user token limits
        manager
            .create_index(
                Index::create()
                    .name("idx_auth_token_user")
                    .table(AuthToken::Table)
                    .col(AuthToken::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_city_country").table(City::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_auth_token_key").table(AuthToken::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_auth_token_user").table(AuthToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum City { Table, CountryId }

#[derive(DeriveIden)]
enum AuthToken { Table, TokenKey, UserId }
