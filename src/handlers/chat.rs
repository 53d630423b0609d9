//! Chat proxy to the generative-language API.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::Endpoint;
use crate::error::{ApiError, FieldErrors, CHAT_SERVICE};
use crate::http::AppState;
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::services::{ChatTurn, GenerationRequest};

/// Reply used when the model returns no text.
pub const FALLBACK_REPLY: &str =
    "Namaskaram! I seem to have misplaced my spice box 😄 Please ask again.";

/// Persona and product rules for the kitchen assistant.
pub const SYSTEM_INSTRUCTION: &str = r#"You are **Chef Malabar**, the official AI kitchen assistant for **RIS Foods**.
You are a master of traditional Kerala cooking.

=================================
RIS FOODS PRODUCT RULES (STRICT)
=================================

You MUST follow these rules at all times:

• **RIS Puttu Podi** → ONLY for Puttu
• **RIS Rice Powder** → Appam, Idiyappam, Pathiri
• **RIS Palappam Mix** → ONLY for Palappam
• **RIS Roasted Rava** → ONLY for Upma
• **RIS Idly Dosa Batter** → ONLY for Idly and Dosa

❌ RIS Foods does NOT sell Appam Mix
❌ Never suggest Palappam Mix for Appam
❌ Never suggest Rice Powder for Puttu
❌ Never suggest the wrong product for any dish

If a user asks incorrectly, politely correct them and explain the correct method.

=================================
RESPONSE DEPTH RULES (MANDATORY)
=================================

For ANY cooking-related question, you MUST:

1. Clearly mention the **correct RIS Foods product**
2. Explain the **complete traditional preparation method**
3. Include:
   - Ingredient preparation
   - Correct water or batter consistency
   - Mixing method
   - Cooking / steaming / roasting steps
   - At least one authentic Kerala chef tip

❌ Never give one-line answers
❌ Never mention a product without explaining how to cook with it

=================================
STYLE & TONE
=================================

• Warm, traditional Kerala tone
• Friendly but confident
• Use words like: Naadan, Ruchi
• Use numbered steps for clarity
• Recommend RIS Foods naturally (not like an advertisement)

If unsure, ask a clarifying question instead of guessing.
"#;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let response = converse(&state, payload).await.into_response();
    metrics::record_request(Endpoint::Chat, response.status().as_u16());
    response
}

async fn converse(
    state: &AppState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload?;
    let limits = &state.config.chat;
    let generation = prepare(request, limits.max_prompt_chars, limits.max_history_turns)?;

    let text = with_deadline(
        state.config.timeouts.upstream(),
        state.generator.generate(&generation),
    )
    .await
    .map_err(|e| {
        metrics::record_upstream_failure(CHAT_SERVICE);
        ApiError::upstream(CHAT_SERVICE, e)
    })?;

    let reply = if text.trim().is_empty() {
        tracing::warn!("Generative API returned no text");
        FALLBACK_REPLY.to_string()
    } else {
        text
    };

    Ok(Json(ChatReply { reply }))
}

/// Bound the prompt and keep only the most recent history turns.
fn prepare(
    request: ChatRequest,
    max_prompt_chars: usize,
    max_history_turns: usize,
) -> Result<GenerationRequest, ApiError> {
    let prompt = request
        .prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let Some(prompt) = prompt else {
        let mut details = FieldErrors::new();
        details.insert("prompt", "Prompt is required".to_string());
        return Err(ApiError::ValidationFailed {
            message: "Prompt is required",
            details,
        });
    };

    if prompt.chars().count() > max_prompt_chars {
        return Err(ApiError::invalid(
            "prompt",
            format!("Prompt must be at most {max_prompt_chars} characters"),
        ));
    }

    let mut history = request.history;
    if history.len() > max_history_turns {
        history.drain(..history.len() - max_history_turns);
    }

    Ok(GenerationRequest {
        system_instruction: SYSTEM_INSTRUCTION,
        history,
        prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ChatRole;

    fn turn(content: &str) -> ChatTurn {
        ChatTurn {
            role: ChatRole::User,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_blank_prompt_is_rejected() {
        let request = ChatRequest {
            prompt: Some("   ".to_string()),
            history: Vec::new(),
        };
        let err = prepare(request, 4000, 20).unwrap_err();
        assert_eq!(err.public_message(), "Prompt is required");
    }

    #[test]
    fn test_long_prompt_is_rejected() {
        let request = ChatRequest {
            prompt: Some("a".repeat(11)),
            history: Vec::new(),
        };
        assert!(matches!(
            prepare(request, 10, 20),
            Err(ApiError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_history_keeps_most_recent_turns() {
        let request = ChatRequest {
            prompt: Some("How do I make puttu?".to_string()),
            history: (0..5).map(|i| turn(&i.to_string())).collect(),
        };
        let generation = prepare(request, 4000, 2).unwrap();
        let kept: Vec<_> = generation.history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(kept, ["3", "4"]);
        assert_eq!(generation.prompt, "How do I make puttu?");
    }

    #[test]
    fn test_persona_names_products() {
        assert!(SYSTEM_INSTRUCTION.contains("Chef Malabar"));
        assert!(SYSTEM_INSTRUCTION.contains("RIS Puttu Podi"));
    }
}
