use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single conversation turn. The client owns the transcript; turns arrive
/// on every chat call and are discarded once a reply is produced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: String, // "user" or "assistant"
    pub content: String,
}
