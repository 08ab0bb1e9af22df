//! handlers/settings_handler.rs

use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    errors::AppError,
    handlers::require_caller,
    models::settings_model::SaveSettingsRequest,
    services::{auth_service::Authenticator, settings_service::SettingsService},
};

/// GET /api/settings
pub async fn get_settings_endpoint(
    req: HttpRequest,
    auth: web::Data<dyn Authenticator>,
    settings_service: web::Data<SettingsService>,
) -> Result<HttpResponse, AppError> {
    let caller = require_caller(&req, &auth).await?;
    Ok(HttpResponse::Ok().json(settings_service.get_settings(&caller).await?))
}

/// PUT /api/settings
pub async fn save_settings_endpoint(
    req: HttpRequest,
    auth: web::Data<dyn Authenticator>,
    settings_service: web::Data<SettingsService>,
    body: web::Json<SaveSettingsRequest>,
) -> Result<HttpResponse, AppError> {
    let caller = require_caller(&req, &auth).await?;
    let saved = settings_service
        .save_settings(&caller, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(saved))
}
