use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;

use crate::models::ErrorBody;
use crate::openai::ProviderError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing prompt")]
    InvalidInput,
    #[error("{message}")]
    ProviderFailure { message: String },
}

impl From<ProviderError> for GatewayError {
    fn from(e: ProviderError) -> Self {
        GatewayError::ProviderFailure { message: e.to_string() }
    }
}

impl GatewayError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput => StatusCode::BAD_REQUEST,
            GatewayError::ProviderFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the HTTP caller. Provider messages pass through as-is;
    /// redact here if a deployment must not expose them.
    pub fn public_message(&self) -> String {
        self.message()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.public_message() };
        (self.status(), Json(body)).into_response()
    }
}
