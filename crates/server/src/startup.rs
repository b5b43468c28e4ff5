use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::account::{repo::SeaOrmAccountRepository, repository::AccountRepository, AccountConfig};

use crate::auth::ServerState;
use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load config.toml when present, otherwise fall back to environment variables.
pub fn load_config() -> Result<configs::AppConfig, StartupError> {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(error = %e, "config.toml unavailable or invalid, using environment");
            configs::AppConfig::from_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
        }
    }
}

/// Assemble the router around any account repository.
pub fn build_app(repo: Arc<dyn AccountRepository>, auth: &configs::AuthSettings) -> Router {
    let state = ServerState::new(repo, AccountConfig::from_settings(auth));
    routes::build_router(state, build_cors())
}

/// Public entry: connect, migrate if asked, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = load_config()?;

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Migration(e.to_string()))?;
        info!("migrations applied");
    }

    let repo: Arc<dyn AccountRepository> = Arc::new(SeaOrmAccountRepository::new(db));
    let app = build_app(repo, &cfg.auth);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    info!(%addr, token_ttl_secs = cfg.auth.token_ttl_secs, "starting user registry server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
