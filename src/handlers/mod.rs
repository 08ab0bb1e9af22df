//! handlers/mod.rs
//! Endpoints HTTP (batch, campañas, settings) y utilidades compartidas.

pub mod batch_handler;
pub mod campaign_handler;
pub mod settings_handler;

use actix_web::{http::header, web, HttpRequest, HttpResponse};

use crate::{
    errors::AppError,
    services::auth_service::{Authenticator, CallerIdentity},
};

/// Valor crudo del header Authorization.
pub fn authorization(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

pub async fn require_caller(
    req: &HttpRequest,
    auth: &web::Data<dyn Authenticator>,
) -> Result<CallerIdentity, AppError> {
    auth.authenticate(authorization(req)).await
}

/// Respuesta al preflight CORS; los headers los añade el middleware del scope.
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
