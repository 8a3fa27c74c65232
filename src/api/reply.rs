//! Text reply endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::reply::ReplyOutcome;

/// Build reply router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/reply", post(reply))
        .with_state(state)
}

/// Reply request
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub text: String,
}

/// Reply response
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
    pub outcome: ReplyOutcome,
}

/// Answer a transcribed utterance
///
/// Always succeeds; degraded answers are told apart by `outcome`.
async fn reply(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ReplyRequest>,
) -> Json<ReplyResponse> {
    let reply = state.replies.respond(&request.text).await;

    Json(ReplyResponse {
        reply: reply.text,
        outcome: reply.outcome,
    })
}
