use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;

use service::account::domain::{LoginInput, LoginOutput, Session, UserInput, UserView};

use crate::auth::ServerState;
use crate::errors::ApiError;

#[utoipa::path(
    post, path = "/auth/register", tag = "auth",
    request_body = crate::openapi::RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = crate::openapi::UserResponse),
        (status = 400, description = "Field-keyed validation errors", body = crate::openapi::FieldErrorsDoc),
        (status = 409, description = "Conflict")
    )
)]
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let Json(body) = payload?;
    let user = state.accounts.register(UserInput::from_json(body)?).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

#[utoipa::path(
    post, path = "/auth/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = crate::openapi::LoginResponse),
        (status = 400, description = "Invalid credentials or inactive account", body = crate::openapi::FieldErrorsDoc),
        (status = 403, description = "Token limit reached")
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoginOutput>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(state.accounts.login(LoginInput::from_json(body)?).await?))
}

#[utoipa::path(
    post, path = "/auth/logout", tag = "auth",
    security(("token" = [])),
    responses((status = 204, description = "Token revoked"), (status = 401, description = "Unauthorized"))
)]
pub async fn logout(State(state): State<ServerState>, Extension(session): Extension<Session>) -> Result<StatusCode, ApiError> {
    state.accounts.logout(session.token.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/auth/logout-all", tag = "auth",
    security(("token" = [])),
    responses((status = 204, description = "All tokens revoked"), (status = 401, description = "Unauthorized"))
)]
pub async fn logout_all(State(state): State<ServerState>, Extension(session): Extension<Session>) -> Result<StatusCode, ApiError> {
    state.accounts.logout_all(session.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
