mod ai;
mod db;
mod handlers;
mod middleware;
mod models;
mod utils;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use ai::client::GroqClient;
use db::user_repository::UserRepository;
use dotenv::dotenv;
use middleware::rate_limit::{RateLimitMiddleware, AI_LIMIT_MESSAGE, GENERAL_LIMIT_MESSAGE};
use std::env;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::api::health,
        handlers::auth::login,
        handlers::chat::chat,
    ),
    components(
        schemas(
            handlers::api::HealthResponse,
            handlers::auth::LoginRequest,
            handlers::auth::AuthResponse,
            handlers::auth::UserResponse,
            handlers::chat::ChatRequest,
            handlers::chat::ChatResponse,
            models::chat::ChatMessage,
            models::user::User,
            models::user::Claims,
            ai::prompt::MessageType,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Name + PIN login issuing bearer tokens"),
        (name = "AI", description = "Protected chat proxy to the AI provider")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}

/// Origins must be explicitly allowed: the configured list, localhost, or a
/// vercel.app deployment. Everything else is refused.
fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    if allowed.iter().any(|a| a == origin) {
        return true;
    }
    let host = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
        .unwrap_or(origin);
    let host = host.split(':').next().unwrap_or(host);
    host == "localhost" || host == "127.0.0.1" || host.ends_with(".vercel.app")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing subscriber for structured logging
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json()
        .init();

    // Seed the credential store before the server starts accepting
    // connections; the default account must be usable on the first request.
    let user_repo = UserRepository::seeded();

    let ai_client = GroqClient::from_env().expect("Failed to initialize AI client");

    // Shared across workers so windows are counted once per client, not per
    // worker thread.
    let api_limiter =
        RateLimitMiddleware::new(100, Duration::from_secs(15 * 60), GENERAL_LIMIT_MESSAGE);
    let ai_limiter = RateLimitMiddleware::new(20, Duration::from_secs(60), AI_LIMIT_MESSAGE);

    let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let bind_address = format!("{}:{}", host, port);

    info!(bind_address = %bind_address, "Starting June backend API server");
    info!("Available endpoints:");
    info!("   GET  /api/health      - Health check (public)");
    info!("   POST /api/auth/login  - Login with name + PIN (public)");
    info!("   POST /api/ai/chat     - Chat with the AI companion (protected)");
    info!(
        swagger_url = format!("http://{}/swagger-ui/", bind_address),
        "Swagger UI available"
    );

    HttpServer::new(move || {
        // Configure CORS
        let origins = allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                origin
                    .to_str()
                    .map(|o| origin_allowed(o, &origins))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        let openapi = ApiDoc::openapi();

        // Malformed JSON bodies get a structured 400 instead of the default
        // error page
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            actix_web::error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Invalid JSON payload"
                })),
            )
            .into()
        });

        App::new()
            .app_data(web::Data::new(user_repo.clone()))
            .app_data(web::Data::new(ai_client.clone()))
            .app_data(json_config)
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Swagger UI
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .service(
                web::scope("/api")
                    .wrap(api_limiter.clone())
                    // Public routes
                    .route("/health", web::get().to(handlers::api::health))
                    .service(
                        web::scope("/auth")
                            .route("/login", web::post().to(handlers::auth::login)),
                    )
                    // Protected routes: AI limiter runs first, then the gate
                    .service(
                        web::scope("/ai")
                            .wrap(middleware::auth::AuthMiddleware)
                            .wrap(ai_limiter.clone())
                            .route("/chat", web::post().to(handlers::chat::chat)),
                    ),
            )
            .default_service(web::route().to(handlers::api::not_found))
    })
    .bind(&bind_address)?
    .run()
    .await
}
