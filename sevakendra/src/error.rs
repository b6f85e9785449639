use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ConsultError {
    #[error("Unsupported file format: {0}. Please upload a .txt or .pdf file")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConsultError>;

impl ConsultError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsultError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ConsultError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConsultError::Validation(_) => StatusCode::BAD_REQUEST,
            ConsultError::NotFound(_) => StatusCode::NOT_FOUND,
            ConsultError::Llm(_) => StatusCode::BAD_GATEWAY,
            ConsultError::Config(_) | ConsultError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConsultError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ConsultError::Config(_) | ConsultError::Io(_) => {
                error!(error = %self, "Internal error");
                "Internal server error".to_string()
            }
            ConsultError::Llm(_) => {
                error!(error = %self, "Upstream model error");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (
            status,
            Json(json!({
                "error": message,
                "status": status.as_u16(),
            })),
        )
            .into_response()
    }
}
