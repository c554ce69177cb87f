use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

async fn handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Agentic Chatbot is running."
    }))
}

pub fn routes() -> Router {
    Router::new().route("/", get(handler))
}
