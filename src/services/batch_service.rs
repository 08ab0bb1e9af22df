//! services/batch_service.rs
//! Dispatcher de batches: autentica, reclama una página de contactos pendientes,
//! personaliza, envía y agrega contadores de la campaña.

use std::sync::Arc;

use chrono::Utc;
use futures_util::{stream, StreamExt};

use crate::{
    config::app_config::DispatchConfig,
    errors::AppError,
    models::{batch_model::BatchResult, campaign_model::Campaign, contact_model::Contact},
    services::{
        auth_service::Authenticator,
        contact_store::ContactStore,
        delivery_service::{DeliveryClient, OutboundEmail},
        render_service::{render, to_html, TemplateFields},
    },
};

/// Resultado de un contacto dentro del batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactOutcome {
    Sent,
    Failed,
}

#[derive(Clone)]
pub struct BatchService {
    auth: Arc<dyn Authenticator>,
    store: Arc<dyn ContactStore>,
    delivery: Arc<dyn DeliveryClient>,
    config: DispatchConfig,
}

impl BatchService {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        store: Arc<dyn ContactStore>,
        delivery: Arc<dyn DeliveryClient>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            auth,
            store,
            delivery,
            config,
        }
    }

    /// Procesa un batch de la campaña.
    ///
    /// Los errores fatales (auth, settings, campaña) abortan antes de tocar
    /// ningún contacto. Los fallos de envío se registran por contacto.
    pub async fn send_batch(
        &self,
        campaign_id: &str,
        batch_size: Option<u32>,
        credential: Option<&str>,
    ) -> Result<BatchResult, AppError> {
        // 1) Caller
        let caller = self.auth.authenticate(credential).await?;

        // 2) Settings de envío con API key
        let settings = self
            .store
            .get_sender_settings(&caller.user_id)
            .await?
            .ok_or_else(AppError::email_not_configured)?;
        let api_key = settings
            .usable_api_key()
            .ok_or_else(AppError::email_not_configured)?
            .to_string();

        // 3) Campaña del caller
        let campaign = self
            .store
            .get_campaign(campaign_id, &caller.user_id)
            .await?
            .ok_or_else(AppError::campaign_not_found)?;

        let limit = self.effective_batch_size(batch_size)?;

        log::info!(
            "Processing emails for campaign: {} (batch_size={})",
            campaign.id,
            limit
        );

        // 4) Página de pendientes
        let contacts = self.store.claim_pending_contacts(&campaign.id, limit).await?;
        if contacts.is_empty() {
            log::info!("No pending contacts for campaign {}", campaign.id);
            return Ok(BatchResult::empty());
        }

        log::info!("Found {} contacts to process", contacts.len());

        let from = settings.sender_address(&self.config.default_from_email);
        let concurrency = self.config.concurrency.max(1);

        // Cada futuro devuelve su propio resultado; se suman al final.
        let outcomes: Vec<ContactOutcome> = stream::iter(contacts)
            .map(|contact| self.process_contact(&campaign, &from, &api_key, contact))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let sent = outcomes
            .iter()
            .filter(|o| **o == ContactOutcome::Sent)
            .count() as u32;
        let failed = outcomes.len() as u32 - sent;

        let updated = self
            .store
            .apply_batch_counters(&campaign.id, sent, failed)
            .await?;

        log::info!(
            "Batch complete - Sent: {}, Failed: {} (campaign {} now {} sent / {} failed of {}, status={})",
            sent,
            failed,
            updated.id,
            updated.sent_count,
            updated.failed_count,
            updated.total_contacts,
            updated.status
        );

        Ok(BatchResult::complete(sent, failed))
    }

    fn effective_batch_size(&self, requested: Option<u32>) -> Result<u32, AppError> {
        match requested {
            None => Ok(self.config.default_batch_size),
            Some(0) => Err(AppError::BadRequest(
                "batch_size must be at least 1".to_string(),
            )),
            Some(n) if n > self.config.max_batch_size => {
                log::warn!(
                    "batch_size {} above maximum, clamping to {}",
                    n,
                    self.config.max_batch_size
                );
                Ok(self.config.max_batch_size)
            }
            Some(n) => Ok(n),
        }
    }

    async fn process_contact(
        &self,
        campaign: &Campaign,
        from: &str,
        api_key: &str,
        contact: Contact,
    ) -> ContactOutcome {
        let email = compose_email(campaign, &contact, from);

        log::info!("Sending email to: {}", contact.email);

        match self.delivery.send(api_key, &email).await {
            Ok(receipt) => {
                log::info!(
                    "Email sent successfully to {} (id={})",
                    contact.email,
                    receipt.id.as_deref().unwrap_or("-")
                );
                if let Err(e) = self.store.mark_contact_sent(&contact.id, Utc::now()).await {
                    log::error!("Failed to record sent status for {}: {:?}", contact.id, e);
                }
                ContactOutcome::Sent
            }
            Err(e) => {
                let mut message = e.to_string();
                if message.trim().is_empty() {
                    message = "Unknown error".to_string();
                }
                log::error!("Failed to send email to {}: {}", contact.email, message);

                if let Err(e) = self.store.mark_contact_failed(&contact.id, &message).await {
                    log::error!("Failed to record failure for {}: {:?}", contact.id, e);
                }
                ContactOutcome::Failed
            }
        }
    }
}

/// Renderiza asunto y cuerpo para un contacto.
pub fn compose_email(campaign: &Campaign, contact: &Contact, from: &str) -> OutboundEmail {
    let subject = render(&campaign.subject, &TemplateFields::subject_for(contact));
    let body = render(&campaign.body, &TemplateFields::body_for(contact));

    OutboundEmail {
        from: from.to_string(),
        to: contact.email.clone(),
        subject,
        html: to_html(&body),
    }
}
