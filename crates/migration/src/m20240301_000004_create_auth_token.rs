//! Create `auth_token` table storing digests of issued login tokens.
//!
//! Only the SHA-512 digest and a short lookup prefix are persisted; the
//! plaintext token is handed to the client once.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthToken::Table)
                    .if_not_exists()
                    .col(uuid(AuthToken::Id).primary_key())
                    .col(integer(AuthToken::UserId).not_null())
                    .col(string_len(AuthToken::TokenKey, 32).not_null())
                    .col(string_len(AuthToken::Digest, 128).unique_key().not_null())
                    .col(timestamp_with_time_zone(AuthToken::CreatedAt).not_null())
                    .col(
                        ColumnDef::new(AuthToken::Expiry)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_token_user")
                            .from(AuthToken::Table, AuthToken::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthToken {
    Table,
    Id,
    UserId,
    TokenKey,
    Digest,
    CreatedAt,
    Expiry,
}

#[derive(DeriveIden)]
enum User { Table, Id }
