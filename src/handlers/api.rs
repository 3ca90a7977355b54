use crate::db::user_repository::UserRepository;
use crate::utils::auth::DEFAULT_JWT_SECRET;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use std::env;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
    pub users_count: usize,
    pub storage_type: String,
}

/// Public health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(user_repo: web::Data<UserRepository>) -> impl Responder {
    let jwt_secret = env::var("JWT_SECRET").ok();
    if jwt_secret.is_none() || jwt_secret.as_deref() == Some(DEFAULT_JWT_SECRET) {
        warn!("Health check: Using default JWT secret - NOT SECURE FOR PRODUCTION");
    }

    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        users_count: user_repo.count(),
        storage_type: "localStorage (client-side)".to_string(),
    })
}

/// Catch-all for unmatched routes
pub async fn not_found(req: HttpRequest) -> impl Responder {
    warn!(method = %req.method(), path = %req.path(), "Route not found");
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Route not found",
        "path": req.path(),
        "method": req.method().as_str()
    }))
}
