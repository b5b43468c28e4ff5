use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;

use service::account::domain::{Session, UserInput, UserView};

use crate::auth::ServerState;
use crate::errors::ApiError;

#[utoipa::path(
    get, path = "/users/me", tag = "users",
    security(("token" = [])),
    responses((status = 200, body = crate::openapi::UserResponse), (status = 401, description = "Unauthorized"))
)]
pub async fn me(Extension(session): Extension<Session>) -> Json<UserView> {
    Json(UserView::from(&session.user))
}

#[utoipa::path(
    put, path = "/users/me", tag = "users",
    security(("token" = [])),
    request_body = crate::openapi::UpdateRequest,
    responses(
        (status = 200, body = crate::openapi::UserResponse),
        (status = 400, description = "Field-keyed validation errors", body = crate::openapi::FieldErrorsDoc),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn replace_me(
    State(state): State<ServerState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    update(state, session, payload, false).await
}

#[utoipa::path(
    patch, path = "/users/me", tag = "users",
    security(("token" = [])),
    request_body = crate::openapi::UpdateRequest,
    responses(
        (status = 200, body = crate::openapi::UserResponse),
        (status = 400, description = "Field-keyed validation errors", body = crate::openapi::FieldErrorsDoc),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn patch_me(
    State(state): State<ServerState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    update(state, session, payload, true).await
}

async fn update(
    state: ServerState,
    session: Session,
    payload: Result<Json<Value>, JsonRejection>,
    partial: bool,
) -> Result<Json<UserView>, ApiError> {
    let Json(body) = payload?;
    let user = state.accounts.update_profile(session.user.id, UserInput::from_json(body)?, partial).await?;
    Ok(Json(UserView::from(&user)))
}
