use crate::ai::client::{AiError, GroqClient};
use crate::ai::prompt::{self, MessageType};
use crate::models::chat::ChatMessage;
use crate::models::user::Claims;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

/// The turns actually sent for this request. Greeting requests discard the
/// client's message content entirely; the synthesized instruction is the
/// only turn that matters.
fn current_turns(
    message_type: MessageType,
    messages: Vec<ChatMessage>,
    user_name: &str,
    history_len: usize,
) -> Vec<ChatMessage> {
    match message_type {
        MessageType::InitialGreeting => vec![ChatMessage {
            role: "user".to_string(),
            content: prompt::greeting_instruction(user_name, history_len),
        }],
        MessageType::Conversation => messages,
    }
}

/// Chat with the AI companion
#[utoipa::path(
    post,
    path = "/api/ai/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply generated", body = ChatResponse),
        (status = 400, description = "Missing messages array"),
        (status = 401, description = "Access token required"),
        (status = 403, description = "Invalid or expired token"),
        (status = 429, description = "Rate limited, locally or upstream"),
        (status = 500, description = "AI service error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "AI"
)]
pub async fn chat(
    claims: web::ReqData<Claims>,
    ai: web::Data<GroqClient>,
    payload: web::Json<ChatRequest>,
) -> impl Responder {
    let payload = payload.into_inner();

    let messages = match payload.messages {
        Some(m) => m,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Messages array is required"
            }));
        }
    };

    let user_name = claims.name.clone();
    let history = payload.conversation_history;

    let system_prompt = prompt::system_prompt(&user_name, payload.message_type);
    let current = current_turns(payload.message_type, messages, &user_name, history.len());

    info!(
        user_id = %claims.sub,
        history_len = history.len(),
        "AI chat request"
    );

    match ai.complete(&system_prompt, &history, current).await {
        Ok(response) => {
            info!(user_id = %claims.sub, "AI response generated");
            HttpResponse::Ok().json(ChatResponse { response })
        }
        Err(AiError::RateLimited) => {
            warn!(user_id = %claims.sub, "Upstream AI rate limit hit");
            HttpResponse::TooManyRequests().json(serde_json::json!({
                "error": "AI service rate limit exceeded. Please try again in a moment."
            }))
        }
        Err(AiError::Upstream(e)) => {
            error!(user_id = %claims.sub, error = %e, "AI chat error");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "AI service error. Please try again."
            }))
        }
    }
}
