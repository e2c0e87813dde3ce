use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use ratedesk_agent::AgentRuntime;
use ratedesk_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { runtime })
}

/// One chat turn. Lookup failures are reported as errors, never as an empty
/// result, and leave the session as it was.
pub async fn chat(
    State(state): State<ChatState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ChatError>)> {
    let correlation_id = Uuid::new_v4().to_string();

    match state.runtime.answer(&body.message, body.session_id.as_deref()).await {
        Ok(reply) => {
            info!(
                event_name = "chat.turn.completed",
                correlation_id = %correlation_id,
                session_id = body
                    .session_id
                    .as_deref()
                    .unwrap_or(state.runtime.default_session_id().as_str()),
                "chat turn answered"
            );
            Ok(Json(ChatResponse { reply }))
        }
        Err(turn_error) => {
            let interface = ApplicationError::from(turn_error).into_interface(&correlation_id);
            error!(
                event_name = "chat.turn.failed",
                correlation_id = %correlation_id,
                error = %interface,
                "chat turn failed"
            );
            Err(interface_error(interface))
        }
    }
}

fn interface_error(error: InterfaceError) -> (StatusCode, Json<ChatError>) {
    let status = match error {
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ChatError {
            error: error.user_message().to_string(),
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}
