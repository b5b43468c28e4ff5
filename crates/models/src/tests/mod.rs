
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

/// DB tests only run when a database is explicitly configured.
pub(crate) fn db_tests_enabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

/// Setup test database with migrations
pub(crate) async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    let db = crate::db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}
