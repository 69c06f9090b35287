use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::chat::{Chat, ChatMessage, ChatRole};
use crate::models::user::UserRole;
use crate::state::AppState;

const CHAT_SYSTEM: &str = "You are an AI Career Assistant helping students with interview prep, \
                           resume analysis, and career advice. Be friendly, specific, and \
                           structured.";
const CHAT_MAX_TOKENS: u32 = 400;
const MAX_MESSAGE_CHARS: usize = 1000;
const HISTORY_WINDOW: usize = 10;
const CONVERSATION_PAGE_SIZE: i64 = 20;

fn validate_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(
            "Message must be at most 1000 characters".to_string(),
        ));
    }
    Ok(())
}

/// Builds the provider prompt from the tail of the conversation. The
/// window keeps prompts bounded on long-running conversations.
fn chat_prompt(history: &[ChatMessage], message: &str) -> String {
    if history.is_empty() {
        return format!("Student's question: {message}");
    }

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let lines: Vec<String> = history[start..]
        .iter()
        .map(|m| {
            let label = match m.role {
                ChatRole::User => "Student",
                ChatRole::Assistant => "Assistant",
            };
            format!("{label}: {}", m.content)
        })
        .collect();

    format!(
        "Previous conversation:\n{}\n\nStudent's question: {message}",
        lines.join("\n")
    )
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub reply: String,
    pub messages: Vec<ChatMessage>,
}

/// POST /api/v1/chat/messages
///
/// Get-or-create: a missing conversation id starts a fresh conversation.
/// The provider call is not shielded; an outage surfaces to the caller and
/// the user message is not persisted without its reply.
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    user.require_role(UserRole::Student)?;

    validate_message(&req.message)?;
    let message = req.message.trim().to_string();
    let now = Utc::now();

    let chat = match &req.conversation_id {
        Some(cid) => sqlx::query_as::<_, Chat>(
            "SELECT * FROM chats WHERE conversation_id = $1 AND student_id = $2 AND is_active",
        )
        .bind(cid)
        .bind(user.id())
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {cid} not found")))?,
        None => {
            let conversation_id = format!("conv-{}", Uuid::new_v4());
            let title = format!("Chat - {}", now.format("%Y-%m-%d"));
            let topic = req.topic.clone().unwrap_or_else(|| "general".to_string());

            sqlx::query_as::<_, Chat>(
                r#"
                INSERT INTO chats (student_id, conversation_id, title, topic)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(user.id())
            .bind(&conversation_id)
            .bind(&title)
            .bind(&topic)
            .fetch_one(&state.db)
            .await?
        }
    };

    let reply = state
        .llm
        .complete(
            CHAT_SYSTEM,
            &chat_prompt(&chat.messages.0, &message),
            CHAT_MAX_TOKENS,
        )
        .await?;

    let mut messages = chat.messages.0;
    messages.push(ChatMessage {
        role: ChatRole::User,
        content: message,
        timestamp: now,
    });
    messages.push(ChatMessage {
        role: ChatRole::Assistant,
        content: reply.clone(),
        timestamp: Utc::now(),
    });

    let chat = sqlx::query_as::<_, Chat>(
        "UPDATE chats SET messages = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(SqlJson(messages))
    .bind(chat.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ChatResponse {
        conversation_id: chat.conversation_id,
        reply,
        messages: chat.messages.0,
    }))
}

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub title: String,
    pub topic: String,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// GET /api/v1/chat/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    user.require_role(UserRole::Student)?;

    let chats = sqlx::query_as::<_, Chat>(
        r#"
        SELECT * FROM chats
        WHERE student_id = $1 AND is_active
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    )
    .bind(user.id())
    .bind(CONVERSATION_PAGE_SIZE)
    .fetch_all(&state.db)
    .await?;

    let summaries = chats
        .into_iter()
        .map(|c| ConversationSummary {
            conversation_id: c.conversation_id,
            title: c.title,
            topic: c.topic,
            message_count: c.messages.0.len(),
            updated_at: c.updated_at,
        })
        .collect();

    Ok(Json(summaries))
}

/// GET /api/v1/chat/conversations/:conversation_id
pub async fn get_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<Chat>, AppError> {
    user.require_role(UserRole::Student)?;

    let chat = sqlx::query_as::<_, Chat>(
        "SELECT * FROM chats WHERE conversation_id = $1 AND student_id = $2 AND is_active",
    )
    .bind(&conversation_id)
    .bind(user.id())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))?;

    Ok(Json(chat))
}

/// DELETE /api/v1/chat/conversations/:conversation_id
pub async fn delete_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require_role(UserRole::Student)?;

    let result = sqlx::query(
        r#"
        UPDATE chats SET is_active = FALSE, updated_at = now()
        WHERE conversation_id = $1 AND student_id = $2 AND is_active
        "#,
    )
    .bind(&conversation_id)
    .bind(user.id())
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Conversation {conversation_id} not found"
        )));
    }

    Ok(Json(json!({ "message": "Conversation deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn blank_message_rejected() {
        assert!(matches!(
            validate_message("   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn overlong_message_rejected() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(matches!(
            validate_message(&long),
            Err(AppError::Validation(_))
        ));
        assert!(validate_message(&"x".repeat(MAX_MESSAGE_CHARS)).is_ok());
    }

    #[test]
    fn first_message_has_no_history_block() {
        let prompt = chat_prompt(&[], "How do I prepare for a systems interview?");
        assert_eq!(
            prompt,
            "Student's question: How do I prepare for a systems interview?"
        );
    }

    #[test]
    fn history_lines_are_labelled_by_role() {
        let history = vec![
            make_message(ChatRole::User, "What is a good resume length?"),
            make_message(ChatRole::Assistant, "One page for campus roles."),
        ];

        let prompt = chat_prompt(&history, "And for experienced roles?");
        assert!(prompt.contains("Student: What is a good resume length?"));
        assert!(prompt.contains("Assistant: One page for campus roles."));
        assert!(prompt.ends_with("Student's question: And for experienced roles?"));
    }

    #[test]
    fn history_window_keeps_only_the_tail() {
        let history: Vec<ChatMessage> = (0..25)
            .map(|i| make_message(ChatRole::User, &format!("message {i}")))
            .collect();

        let prompt = chat_prompt(&history, "latest");
        assert!(!prompt.contains("message 14"));
        assert!(prompt.contains("message 15"));
        assert!(prompt.contains("message 24"));
    }
}
