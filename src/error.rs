use async_openai::error::OpenAIError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// Failure modes of the generation gateway. Either the upstream call itself
/// failed, or a reply came back but no course document could be extracted
/// from it. `Parse` carries the raw reply for diagnostics; it is returned to
/// the client as `rawResponse`, never rendered to the end user.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("text-generation API key is not configured")]
    MissingCredential,
    #[error("upstream text-generation call failed: {detail}")]
    Upstream { detail: String },
    #[error("failed to parse course structure from model reply: {reason}")]
    Parse { reason: String, raw: String },
}

impl From<OpenAIError> for GenerateError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::ApiError(api) => GenerateError::Upstream { detail: api.message },
            other => GenerateError::Upstream {
                detail: other.to_string(),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("course generation failed: {0}")]
    Generation(#[from] GenerateError),
    #[error("storage operation failed: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Generation(GenerateError::MissingCredential) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) | AppError::Session(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        let mut body = json!({ "success": false, "error": self.to_string() });
        if let AppError::Generation(GenerateError::Parse { raw, .. }) = &self {
            body["rawResponse"] = Value::String(raw.clone());
        }
        (status, Json(body)).into_response()
    }
}
