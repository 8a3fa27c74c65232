//! Spoken conversation endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use super::ApiState;
use crate::Error;
use crate::reply::ReplyOutcome;
use crate::voice::validate_recording;

/// MIME type of synthesized replies
const REPLY_AUDIO_MIME: &str = "audio/mpeg";

/// Largest accepted recording (Whisper's upload cap)
pub const MAX_RECORDING_BYTES: usize = 25 * 1024 * 1024;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/converse",
            post(converse).layer(DefaultBodyLimit::max(MAX_RECORDING_BYTES)),
        )
        .with_state(state)
}

/// Conversation turn response
#[derive(Debug, Serialize)]
pub struct ConverseResponse {
    pub transcript: String,
    pub reply: String,
    pub outcome: ReplyOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_mime: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
}

/// Run one spoken turn
///
/// Accepts a recorded utterance (WAV or `WebM`) and returns the transcript,
/// Krishna's reply and the spoken reply as base64 MP3
async fn converse(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<ConverseResponse>, VoiceError> {
    let conversation = state
        .conversation
        .as_ref()
        .ok_or(VoiceError::NotConfigured("voice not configured (missing STT/TTS keys)"))?;

    validate_recording(&body).map_err(|e| VoiceError::BadRequest(e.to_string()))?;

    let turn = conversation.turn(&body).await.map_err(|e| match e {
        Error::NoSpeech => VoiceError::NoSpeech,
        Error::Audio(msg) => VoiceError::BadRequest(msg),
        other => VoiceError::TranscriptionFailed(other.to_string()),
    })?;

    let has_audio = turn.audio.is_some();
    Ok(Json(ConverseResponse {
        transcript: turn.transcript,
        reply: turn.reply.text,
        outcome: turn.reply.outcome,
        audio_base64: turn.audio.map(|audio| BASE64.encode(audio)),
        audio_mime: has_audio.then_some(REPLY_AUDIO_MIME),
        synthesis_error: turn.synthesis_error,
    }))
}

/// Voice API errors
#[derive(Debug)]
pub enum VoiceError {
    NotConfigured(&'static str),
    BadRequest(String),
    NoSpeech,
    TranscriptionFailed(String),
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NoSpeech => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_speech",
                "no speech detected, please try again".to_string(),
            ),
            Self::TranscriptionFailed(msg) => (StatusCode::BAD_GATEWAY, "transcription_failed", msg),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
