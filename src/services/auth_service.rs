//! services/auth_service.rs
//! Resolución del token bearer a un usuario. La emisión de tokens queda fuera.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `credential` es el valor crudo del header Authorization (con o sin "Bearer ").
    async fn authenticate(&self, credential: Option<&str>) -> Result<CallerIdentity, AppError>;
}

/// Extrae el token, tolerando el prefijo "Bearer ".
pub fn parse_bearer(credential: Option<&str>) -> Option<&str> {
    let raw = credential?.trim_start();
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
        .trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone, Debug)]
pub struct TokenAuthenticator {
    db_pool: Pool<Sqlite>,
}

impl TokenAuthenticator {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        TokenAuthenticator { db_pool }
    }

    /// Registra (o reasigna) un token. Usado por el bootstrap y los tests.
    pub async fn register_token(
        &self,
        token: &str,
        user_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token, user_id, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (token) DO UPDATE SET
                user_id = excluded.user_id,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(now)
        .bind(expires_at.map(|t| t.to_rfc3339()))
        .execute(&self.db_pool)
        .await
        .context("Failed to register auth token")?;
        Ok(())
    }

    async fn lookup(&self, token: &str) -> Result<Option<(String, Option<String>)>> {
        let row: Option<(String, Option<String>)> =
            sqlx::query_as("SELECT user_id, expires_at FROM auth_tokens WHERE token = ?1")
                .bind(token)
                .fetch_optional(&self.db_pool)
                .await
                .context("Failed to look up auth token")?;
        Ok(row)
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, credential: Option<&str>) -> Result<CallerIdentity, AppError> {
        let token = parse_bearer(credential).ok_or(AppError::Unauthorized)?;

        let (user_id, expires_at) = self.lookup(token).await?.ok_or(AppError::Unauthorized)?;

        if let Some(expires_at) = expires_at {
            let expires_at = DateTime::parse_from_rfc3339(&expires_at)
                .context("Invalid auth token expiry")?;
            if expires_at.with_timezone(&Utc) <= Utc::now() {
                log::warn!("Rejected expired token for user {}", user_id);
                return Err(AppError::Unauthorized);
            }
        }

        Ok(CallerIdentity { user_id })
    }
}
