use crate::db::user_repository::UserRepository;
use crate::utils::auth::{create_jwt, verify_pin};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub name: Option<String>,
    pub pin: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
}

/// Login with name and PIN
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing name or PIN"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    user_repo: web::Data<UserRepository>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    let (name, pin) = match (payload.name.as_deref(), payload.pin.as_deref()) {
        (Some(name), Some(pin)) if !name.is_empty() && !pin.is_empty() => (name, pin),
        _ => {
            warn!("Login failed: missing name or pin");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Name and PIN are required"
            }));
        }
    };

    let user_id = name.trim().to_lowercase();
    info!(user_id = %user_id, "Login attempt");

    // Unknown user and wrong PIN are indistinguishable to the caller
    let user = match user_repo.get(&user_id) {
        Some(u) => u,
        None => {
            warn!(user_id = %user_id, "Login failed: user not found");
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Invalid credentials"
            }));
        }
    };

    if !verify_pin(pin, &user.pin_hash) {
        warn!(user_id = %user_id, "Login failed: invalid credentials");
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid credentials"
        }));
    }

    let token = match create_jwt(&user.id, &user.display_name) {
        Ok(t) => t,
        Err(e) => {
            error!(error = ?e, user_id = %user.id, "Failed to generate JWT");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to generate token"
            }));
        }
    };

    info!(user_id = %user.id, "User logged in successfully");

    HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserResponse {
            id: user.id.clone(),
            name: user.display_name.clone(),
        },
    })
}
