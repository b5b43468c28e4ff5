#![cfg(test)]
use std::sync::Arc;

use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::connect_with_config;

use crate::account::domain::UserInput;
use crate::account::repository::mock::MockAccountRepository;
use crate::account::service::{AccountConfig, AccountService};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// DB tests only run when a database is explicitly configured.
pub fn db_tests_enabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

fn test_db_config() -> configs::DatabaseConfig {
    let mut cfg = configs::DatabaseConfig::default();
    cfg.normalize_from_env();
    cfg.min_connections = 1;
    cfg.max_connections = cfg.max_connections.max(10);
    cfg
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    MIGRATED
        .get_or_init(|| async {
            let db = connect_with_config(&test_db_config()).await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
        })
        .await;
    connect_with_config(&test_db_config()).await
}

/// Mock repository seeded with Norway (1: Oslo, 2: Bergen) and Sweden (3: Stockholm).
pub fn seeded_repo() -> Arc<MockAccountRepository> {
    let repo = MockAccountRepository::default();
    repo.add_country(1, "Norway");
    repo.add_country(2, "Sweden");
    repo.add_city(1, 1, "Oslo");
    repo.add_city(2, 1, "Bergen");
    repo.add_city(3, 2, "Stockholm");
    Arc::new(repo)
}

pub fn service(repo: Arc<MockAccountRepository>) -> AccountService<MockAccountRepository> {
    AccountService::new(repo, AccountConfig::default())
}

/// A complete, valid registration payload.
pub fn registration(username: &str, email: &str) -> UserInput {
    UserInput {
        username: Some(username.to_string()),
        first_name: Some("Alice".into()),
        last_name: Some("Liddell".into()),
        email: Some(email.to_string()),
        gender: Some(crate::account::domain::Gender::Female),
        age: Some(30),
        country: Some(1),
        city: Some(1),
        password: Some("Secret123".into()),
        confirm_password: Some("Secret123".into()),
        current_password: None,
    }
}
