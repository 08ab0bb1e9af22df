use std::str::FromStr;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::auth_service::{Authenticator, TokenAuthenticator};
use crate::services::batch_service::BatchService;
use crate::services::campaign_service::CampaignService;
use crate::services::contact_store::{ContactStore, SqliteContactStore};
use crate::services::delivery_service::{DeliveryClient, ResendClient};
use crate::services::settings_service::SettingsService;

mod app;
mod config;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

async fn setup_database(database_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    // Crear carpeta del archivo si es una ruta local
    if let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    {
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && path != ":memory:" {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create directory {:?}", parent))?;
            }
        }
    }

    log::info!("Conectando a SQLite en {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)
        .context("Invalid DATABASE_URL")?
        .create_if_missing(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite.")?;

    Ok(db_pool)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env();
    log::info!(
        "Config loaded: port={}, default_batch_size={}, max_batch_size={}, concurrency={}",
        config.port,
        config.dispatch.default_batch_size,
        config.dispatch.max_batch_size,
        config.dispatch.concurrency
    );

    // Conectarnos a la DB
    let db_pool = setup_database(&config.database_url).await?;

    let contact_store = SqliteContactStore::new(db_pool.clone());
    contact_store
        .run_migrations()
        .await
        .context("Fallo en migraciones")?;

    let authenticator = TokenAuthenticator::new(db_pool.clone());
    if let (Some(token), Some(user_id)) = (&config.bootstrap_auth_token, &config.bootstrap_user_id)
    {
        authenticator.register_token(token, user_id, None).await?;
        log::info!("Bootstrap token registered for user {}", user_id);
    }

    let store: Arc<dyn ContactStore> = Arc::new(contact_store);
    let auth: Arc<dyn Authenticator> = Arc::new(authenticator);
    let delivery: Arc<dyn DeliveryClient> = Arc::new(ResendClient::new(
        config.resend_api_url.clone(),
        config.delivery_timeout(),
    )?);

    let batch_service = BatchService::new(
        auth.clone(),
        store.clone(),
        delivery,
        config.dispatch.clone(),
    );
    let campaign_service = CampaignService::new(store.clone());
    let settings_service = SettingsService::new(store);

    // Levantar servidor
    log::info!("Levantando servidor en {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(auth.clone()))
            .app_data(web::Data::new(batch_service.clone()))
            .app_data(web::Data::new(campaign_service.clone()))
            .app_data(web::Data::new(settings_service.clone()))
            .configure(app::init_app)
    })
    .workers(config.http_workers)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
