use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use service::account::{
    repository::AccountRepository, validation::messages, AccountConfig, AccountError, AccountService,
};

use crate::errors::ApiError;

pub type Accounts = AccountService<dyn AccountRepository>;

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub accounts: Arc<Accounts>,
}

impl ServerState {
    pub fn new(repo: Arc<dyn AccountRepository>, cfg: AccountConfig) -> Self {
        Self { accounts: Arc::new(AccountService::new(repo, cfg)) }
    }
}

/// Extract the raw token from `Authorization: Token <t>` (or `Bearer <t>`).
pub fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Some(token)
    } else {
        None
    }
}

/// Route middleware: resolve the presented token to a `Session` and store it
/// in the request extensions. Missing or invalid tokens answer 401.
pub async fn require_token(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let header_value = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let Some(header_value) = header_value else {
        tracing::debug!(path = %req.uri().path(), "missing Authorization header");
        return Err(AccountError::Unauthenticated(messages::NOT_AUTHENTICATED).into());
    };
    let Some(raw) = token_from_header(header_value) else {
        tracing::warn!(path = %req.uri().path(), "malformed Authorization header");
        return Err(AccountError::Unauthenticated(messages::INVALID_TOKEN).into());
    };
    let raw = raw.to_string();
    let session = state.accounts.authenticate_token(&raw).await?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
