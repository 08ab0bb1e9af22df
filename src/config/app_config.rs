//! config/app_config.rs
//! Configuración global leída de variables de entorno (.env vía dotenv).

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FROM_EMAIL: &str = "onboarding@resend.dev";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub http_workers: usize,
    pub database_url: String,
    pub resend_api_url: String,
    pub delivery_timeout_secs: u64,
    pub dispatch: DispatchConfig,
    /// Token sembrado al arrancar (la emisión de tokens vive fuera del servicio).
    pub bootstrap_auth_token: Option<String>,
    pub bootstrap_user_id: Option<String>,
}

/// Parámetros del dispatcher de batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub default_batch_size: u32,
    pub max_batch_size: u32,
    /// 1 = secuencial
    pub concurrency: usize,
    pub default_from_email: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            default_batch_size: 10,
            max_batch_size: 100,
            concurrency: 1,
            default_from_email: DEFAULT_FROM_EMAIL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = DispatchConfig::default();

        let default_batch_size = parse_or("DEFAULT_BATCH_SIZE", defaults.default_batch_size).max(1);
        let max_batch_size = parse_or("MAX_BATCH_SIZE", defaults.max_batch_size).max(default_batch_size);

        AppConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 5022),
            http_workers: parse_or("HTTP_WORKERS", 1usize).max(1),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/outreach.db".to_string()),
            resend_api_url: env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            delivery_timeout_secs: parse_or("DELIVERY_TIMEOUT_SECS", 30u64).max(1),
            dispatch: DispatchConfig {
                default_batch_size,
                max_batch_size,
                concurrency: parse_or("DISPATCH_CONCURRENCY", defaults.concurrency).max(1),
                default_from_email: env::var("DEFAULT_FROM_EMAIL")
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(defaults.default_from_email),
            },
            bootstrap_auth_token: non_empty_var("BOOTSTRAP_AUTH_TOKEN"),
            bootstrap_user_id: non_empty_var("BOOTSTRAP_USER_ID"),
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lee y parsea una variable; si no existe o es inválida usa `default`.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Invalid value '{}' for {}, using default {}", raw, name, default);
                default
            }
        },
        Err(_) => default,
    }
}
