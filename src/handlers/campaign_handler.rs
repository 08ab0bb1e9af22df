//! handlers/campaign_handler.rs

use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    errors::AppError,
    handlers::require_caller,
    models::{
        campaign_model::{CreateCampaignRequest, ListCampaignsResponse, UpdateTemplateRequest},
        contact_model::ListContactsResponse,
    },
    services::{auth_service::Authenticator, campaign_service::CampaignService},
};

/// POST /api/campaigns
pub async fn create_campaign_endpoint(
    req: HttpRequest,
    auth: web::Data<dyn Authenticator>,
    campaign_service: web::Data<CampaignService>,
    body: web::Json<CreateCampaignRequest>,
) -> Result<HttpResponse, AppError> {
    let caller = require_caller(&req, &auth).await?;
    let campaign = campaign_service
        .create_campaign(&caller, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(campaign))
}

/// GET /api/campaigns
pub async fn list_campaigns_endpoint(
    req: HttpRequest,
    auth: web::Data<dyn Authenticator>,
    campaign_service: web::Data<CampaignService>,
) -> Result<HttpResponse, AppError> {
    let caller = require_caller(&req, &auth).await?;
    let items = campaign_service.list_campaigns(&caller).await?;
    Ok(HttpResponse::Ok().json(ListCampaignsResponse {
        total: items.len(),
        items,
    }))
}

/// GET /api/campaigns/{id}
pub async fn get_campaign_endpoint(
    req: HttpRequest,
    auth: web::Data<dyn Authenticator>,
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let caller = require_caller(&req, &auth).await?;
    let detail = campaign_service
        .campaign_detail(&caller, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// PUT /api/campaigns/{id}/template
pub async fn update_template_endpoint(
    req: HttpRequest,
    auth: web::Data<dyn Authenticator>,
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
    body: web::Json<UpdateTemplateRequest>,
) -> Result<HttpResponse, AppError> {
    let caller = require_caller(&req, &auth).await?;
    let campaign = campaign_service
        .update_template(&caller, &path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(campaign))
}

/// GET /api/campaigns/{id}/contacts
pub async fn list_contacts_endpoint(
    req: HttpRequest,
    auth: web::Data<dyn Authenticator>,
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let caller = require_caller(&req, &auth).await?;
    let items = campaign_service
        .list_contacts(&caller, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ListContactsResponse {
        total: items.len(),
        items,
    }))
}
