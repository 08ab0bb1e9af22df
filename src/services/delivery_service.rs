//! services/delivery_service.rs
//! Cliente del proveedor de email (API tipo Resend): un POST por correo.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Correo ya personalizado, listo para el proveedor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeliveryReceipt {
    #[serde(default)]
    pub id: Option<String>,
}

/// Fallo de un envío individual. Nunca aborta un batch.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// El proveedor respondió con un status no-2xx.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn send(
        &self,
        api_key: &str,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Cuerpo JSON que espera el proveedor.
#[derive(Serialize)]
struct ProviderPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ResendClient {
    http_client: Client,
    base_url: String,
}

impl ResendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DeliveryClient for ResendClient {
    async fn send(
        &self,
        api_key: &str,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let url = format!("{}/emails", self.base_url);
        let payload = ProviderPayload {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&body_txt)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Failed to send email".to_string());

            log::debug!(
                "Provider rejected email to {}: status={} body='{}'",
                email.to,
                status,
                body_txt
            );
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        // Un 2xx con cuerpo raro sigue siendo éxito.
        let body_txt = resp.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<DeliveryReceipt>(&body_txt).unwrap_or_default())
    }
}
