use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub version: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenderDoc { Male, Female, Other }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub gender: GenderDoc,
    #[schema(minimum = 0, maximum = 150)]
    pub age: i32,
    pub country: i32,
    pub city: i32,
    pub password: String,
    pub confirm_password: String,
}

/// PUT requires the profile fields; PATCH accepts any subset.
/// A new `password` needs `current_password`.
#[derive(ToSchema)]
pub struct UpdateRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<GenderDoc>,
    pub age: Option<i32>,
    pub country: Option<i32>,
    pub city: Option<i32>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub current_password: Option<String>,
}

#[derive(ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: GenderDoc,
    pub age: i32,
    pub country: i32,
    pub city: i32,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginResponse { pub token: String, pub user_id: i32 }

#[derive(ToSchema)]
pub struct CityResponse { pub id: i32, pub name: String }

#[derive(ToSchema)]
pub struct CountryResponse { pub id: i32, pub name: String, pub cities: Vec<CityResponse> }

/// `{"field": ["message", ...], "non_field_errors": [...]}`
#[derive(ToSchema)]
pub struct FieldErrorsDoc(pub BTreeMap<String, Vec<String>>);

struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token <token>",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::logout_all,
        crate::routes::users::me,
        crate::routes::users::replace_me,
        crate::routes::users::patch_me,
        crate::routes::countries::list,
        crate::routes::countries::get,
    ),
    components(
        schemas(
            HealthResponse,
            GenderDoc,
            RegisterRequest,
            UpdateRequest,
            UserResponse,
            LoginRequest,
            LoginResponse,
            CityResponse,
            CountryResponse,
            FieldErrorsDoc,
        )
    ),
    modifiers(&TokenAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "countries")
    )
)]
pub struct ApiDoc;
