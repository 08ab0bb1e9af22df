//! errors.rs
//! Errores que abortan una petición completa y su mapeo a HTTP.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn email_not_configured() -> Self {
        AppError::Configuration(
            "Email service not configured. Please add your Resend API key in Settings."
                .to_string(),
        )
    }

    pub fn campaign_not_found() -> Self {
        AppError::NotFound("Campaign not found".to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Configuration(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(e) = self {
            log::error!("Internal error: {:?}", e);
        }
        // Herramienta interna: el mensaje se expone tal cual.
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}
