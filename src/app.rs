//! app.rs
use actix_web::{error, http::Method, middleware::DefaultHeaders, web, HttpResponse, Resource};
use serde_json::json;

use crate::handlers::{self, batch_handler, campaign_handler, settings_handler};

/// Herramienta interna: CORS permisivo para cualquier origen.
fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add((
            "Access-Control-Allow-Headers",
            "authorization, x-client-info, apikey, content-type",
        ))
        .add(("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS"))
}

/// Recurso que además responde al preflight OPTIONS.
fn cors_resource(path: &str) -> Resource {
    web::resource(path).route(web::method(Method::OPTIONS).to(handlers::preflight))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "error": message })),
        )
        .into()
    })
}

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health)).service(
        web::scope("/api")
            .wrap(cors_headers())
            .app_data(json_config())
            .service(
                cors_resource("/send-bulk-emails")
                    .route(web::post().to(batch_handler::send_bulk_emails_endpoint)),
            )
            .service(
                cors_resource("/campaigns")
                    .route(web::post().to(campaign_handler::create_campaign_endpoint))
                    .route(web::get().to(campaign_handler::list_campaigns_endpoint)),
            )
            .service(
                cors_resource("/campaigns/{id}")
                    .route(web::get().to(campaign_handler::get_campaign_endpoint)),
            )
            .service(
                cors_resource("/campaigns/{id}/template")
                    .route(web::put().to(campaign_handler::update_template_endpoint)),
            )
            .service(
                cors_resource("/campaigns/{id}/contacts")
                    .route(web::get().to(campaign_handler::list_contacts_endpoint)),
            )
            .service(
                cors_resource("/settings")
                    .route(web::get().to(settings_handler::get_settings_endpoint))
                    .route(web::put().to(settings_handler::save_settings_endpoint)),
            ),
    );
}
