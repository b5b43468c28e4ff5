use axum::{
    extract::{Path, State},
    Json,
};

use service::account::domain::CountryView;

use crate::auth::ServerState;
use crate::errors::ApiError;

#[utoipa::path(
    get, path = "/countries", tag = "countries",
    responses((status = 200, body = [crate::openapi::CountryResponse]))
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<CountryView>>, ApiError> {
    Ok(Json(state.accounts.list_countries().await?))
}

#[utoipa::path(
    get, path = "/countries/{id}", tag = "countries",
    params(("id" = i32, Path, description = "Country id")),
    responses((status = 200, body = crate::openapi::CountryResponse), (status = 404, description = "Not found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<i32>) -> Result<Json<CountryView>, ApiError> {
    Ok(Json(state.accounts.get_country(id).await?))
}
