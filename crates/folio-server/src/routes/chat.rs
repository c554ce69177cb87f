use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use folio::errors::AgentError;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    query: String,
    /// Accepted for compatibility with existing clients. Every request is answered statelessly.
    #[serde(default = "default_thread_id")]
    thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    response: String,
}

fn default_thread_id() -> String {
    "default_thread".to_string()
}

/// Any failure of the invocation, reported as `500 {"detail": ...}`
pub struct ChatError(AgentError);

impl From<AgentError> for ChatError {
    fn from(err: AgentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    tracing::info!(thread_id = %request.thread_id, "chat request");

    match state.agent.answer(&request.query).await {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(e) => {
            tracing::error!(thread_id = %request.thread_id, "chat request failed: {}", e);
            Err(e.into())
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use folio::agent::Agent;
    use folio::models::message::Message;
    use folio::models::tool::Tool;
    use folio::providers::base::{Provider, Usage};
    use folio::tools::registry::ToolRegistry;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Shout;

    #[async_trait]
    impl Provider for Shout {
        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[Tool],
        ) -> anyhow::Result<(Message, Usage)> {
            let question = messages.last().map(|m| m.text()).unwrap_or_default();
            Ok((
                Message::assistant().with_text(question.to_uppercase()),
                Usage::default(),
            ))
        }
    }

    struct Offline;

    #[async_trait]
    impl Provider for Offline {
        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[Tool],
        ) -> anyhow::Result<(Message, Usage)> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn app(provider: Arc<dyn Provider>) -> Router {
        let agent = Agent::new(provider, Arc::new(ToolRegistry::new()), "system");
        routes(AppState::new(agent))
    }

    async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_answers_query() {
        let (status, body) = post_chat(
            app(Arc::new(Shout)),
            json!({"query": "what are his skills?", "thread_id": "t-1"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": "WHAT ARE HIS SKILLS?"}));
    }

    #[tokio::test]
    async fn test_thread_id_is_optional() {
        let (status, body) = post_chat(app(Arc::new(Shout)), json!({"query": "hi"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "HI");
    }

    #[tokio::test]
    async fn test_backend_failure_is_500_with_detail() {
        let (status, body) = post_chat(app(Arc::new(Offline)), json!({"query": "hi"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("connection refused"));
    }
}
