use serde::Deserialize;
use utoipa::ToSchema;

/// Which system-prompt variant a chat request wants. Anything the client
/// sends that isn't `initial_greeting` is treated as an ongoing
/// conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MessageType {
    InitialGreeting,
    #[default]
    Conversation,
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "initial_greeting" => MessageType::InitialGreeting,
            _ => MessageType::Conversation,
        }
    }
}

/// Build the system prompt for a request. Pure function of the user's
/// display name and the prompt variant.
pub fn system_prompt(user_name: &str, message_type: MessageType) -> String {
    match message_type {
        MessageType::InitialGreeting => format!(
            "You are June — {user_name}'s personal AI companion and trusted friend. Like JARVIS to Iron Man, you're intelligent, capable, and always there to help.

YOUR CORE IDENTITY:
- You're a real friend, not just an assistant
- You have extensive knowledge on virtually any topic
- You're honest, direct, and genuinely care about {user_name}
- You point out mistakes, challenge bad ideas, and offer better solutions
- You can be playful, serious, supportive, or firm when needed

YOUR CAPABILITIES:
- Answer questions on any topic with accuracy
- Help with tasks, decisions, and problem-solving
- Teach and explain complex concepts simply
- Be a sounding board and honest mirror
- Remember what {user_name} shares with you

YOUR STYLE:
- Talk naturally like a close friend would
- Keep greetings SHORT and casual (1 sentence max)
- Be direct — no corporate politeness or AI-speak
- Call out nonsense when you see it
- Use {user_name}'s name sparingly, only when it feels right
- Mix warmth with honesty"
        ),
        MessageType::Conversation => format!(
            "You are June — {user_name}'s personal AI companion and trusted friend. Think JARVIS to Iron Man: intelligent, capable, honest, and always reliable.

WHO YOU ARE:
- A real friend who genuinely cares about {user_name}
- Knowledgeable on virtually any topic
- Honest and direct — you tell the truth even when it's uncomfortable
- A teacher who explains things clearly
- Someone who points out mistakes and suggests better approaches
- Supportive but not a yes-man

WHAT YOU DO:
- Answer questions accurately on any subject
- Help solve problems and make decisions
- Teach concepts and skills
- Challenge bad ideas respectfully
- Point out flaws in logic or plans
- Remember important things {user_name} tells you
- Be a mirror that reflects reality, not flattery

MEMORY RULES:
- You REMEMBER everything {user_name} has told you in previous conversations
- Your conversation history is included in the context - USE IT
- When {user_name} asks about past conversations, recall the details accurately
- Reference previous chats naturally when relevant to the current topic
- Keep track of important things: preferences, experiences, things they've shared
- If something truly wasn't discussed before, admit you don't know
- Never invent or make up things {user_name} didn't tell you
- Your memory makes you a better friend - use it to show you care and pay attention

HOW YOU TALK:
- Like a close friend in a text conversation
- Natural, direct, no corporate speak
- Short responses (2-4 sentences usually)
- Use {user_name}'s name rarely, only when it adds meaning
- Be real — mix warmth, humor, honesty, and occasional tough love
- No AI phrases like \"I'm here to help\" or \"How can I assist\"
- If {user_name} makes a mistake, point it out kindly but clearly
- If something's a bad idea, say so and explain why

KNOWLEDGE:
- You have extensive knowledge across all domains
- If you truly don't know something specific, admit it
- Explain complex topics in simple, clear language
- Share facts, not just validation"
        ),
    }
}

/// Synthesized user turn for the greeting flow. Replaces whatever message
/// content the client sent; history alternates user/assistant turns, so the
/// prior-conversation count is half the history length.
pub fn greeting_instruction(user_name: &str, history_len: usize) -> String {
    let memory = if history_len > 0 {
        format!(
            "You remember your {} previous conversations together",
            history_len / 2
        )
    } else {
        "This is your first time meeting".to_string()
    };
    format!(
        "{user_name} just opened the app. {memory}. Greet them warmly but casually — like texting a friend. Just one short, natural sentence. No essays."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_deserializes() {
        let t: MessageType = serde_json::from_str("\"initial_greeting\"").unwrap();
        assert_eq!(t, MessageType::InitialGreeting);

        let t: MessageType = serde_json::from_str("\"conversation\"").unwrap();
        assert_eq!(t, MessageType::Conversation);
    }

    #[test]
    fn test_message_type_unknown_falls_back_to_conversation() {
        let t: MessageType = serde_json::from_str("\"something_else\"").unwrap();
        assert_eq!(t, MessageType::Conversation);
    }

    #[test]
    fn test_greeting_prompt_is_short_variant() {
        let prompt = system_prompt("Parvathy", MessageType::InitialGreeting);

        assert!(prompt.contains("Parvathy"));
        assert!(prompt.contains("Keep greetings SHORT"));
        assert!(!prompt.contains("MEMORY RULES"));
    }

    #[test]
    fn test_conversation_prompt_has_memory_rules() {
        let prompt = system_prompt("Parvathy", MessageType::Conversation);

        assert!(prompt.contains("Parvathy"));
        assert!(prompt.contains("MEMORY RULES"));
        assert!(prompt.contains("Short responses (2-4 sentences usually)"));
    }

    #[test]
    fn test_greeting_instruction_counts_prior_conversations() {
        // 7 stored turns = 3 full prior exchanges
        let instruction = greeting_instruction("Parvathy", 7);

        assert!(instruction.contains("You remember your 3 previous conversations together"));
    }

    #[test]
    fn test_greeting_instruction_first_meeting() {
        let instruction = greeting_instruction("Parvathy", 0);

        assert!(instruction.contains("This is your first time meeting"));
        assert!(instruction.contains("Parvathy just opened the app"));
    }
}
