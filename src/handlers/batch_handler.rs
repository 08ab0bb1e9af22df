//! handlers/batch_handler.rs

use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde_json::json;

use crate::{
    handlers::authorization, models::batch_model::SendBatchRequest,
    services::batch_service::BatchService,
};

/// POST /api/send-bulk-emails
pub async fn send_bulk_emails_endpoint(
    req: HttpRequest,
    batch_service: web::Data<BatchService>,
    body: web::Json<SendBatchRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    match batch_service
        .send_batch(&body.campaign_id, body.batch_size, authorization(&req))
        .await
    {
        Ok(result) => HttpResponse::Ok().json(json!({
            "message": result.message,
            "sent": result.sent,
            "failed": result.failed
        })),
        Err(e) => {
            log::error!("Error in send-bulk-emails for campaign {}: {}", body.campaign_id, e);
            e.error_response()
        }
    }
}
