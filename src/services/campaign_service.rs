//! services/campaign_service.rs
//! Alta de campañas (paso de upload), edición de plantilla y lecturas del dashboard.

use std::sync::Arc;

use crate::{
    errors::AppError,
    models::{
        campaign_model::{
            Campaign, CampaignDetailResponse, CampaignStatus, CreateCampaignRequest,
            UpdateTemplateRequest,
        },
        contact_model::Contact,
    },
    services::{
        auth_service::CallerIdentity,
        contact_store::{ContactStore, NewCampaign},
    },
};

#[derive(Clone)]
pub struct CampaignService {
    store: Arc<dyn ContactStore>,
}

impl CampaignService {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }

    /// Crea la campaña en "draft" con todos sus contactos en "pending".
    pub async fn create_campaign(
        &self,
        caller: &CallerIdentity,
        req: CreateCampaignRequest,
    ) -> Result<Campaign, AppError> {
        if req.name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Please enter a campaign name".to_string(),
            ));
        }
        if req.contacts.is_empty() {
            return Err(AppError::BadRequest(
                "Campaign needs at least one contact".to_string(),
            ));
        }
        if let Some(idx) = req
            .contacts
            .iter()
            .position(|c| c.name.trim().is_empty() || c.email.trim().is_empty())
        {
            return Err(AppError::BadRequest(format!(
                "Contact #{} is missing name or email",
                idx + 1
            )));
        }

        let campaign = self
            .store
            .create_campaign(NewCampaign {
                user_id: caller.user_id.clone(),
                name: req.name.trim().to_string(),
                subject: req.subject.unwrap_or_default(),
                body: req.body.unwrap_or_default(),
                contacts: req.contacts,
            })
            .await?;

        log::info!(
            "Campaign {} created for user {} with {} contacts",
            campaign.id,
            caller.user_id,
            campaign.total_contacts
        );
        Ok(campaign)
    }

    /// Solo se edita mientras la campaña sigue en draft.
    pub async fn update_template(
        &self,
        caller: &CallerIdentity,
        campaign_id: &str,
        req: UpdateTemplateRequest,
    ) -> Result<Campaign, AppError> {
        let campaign = self.owned_campaign(caller, campaign_id).await?;
        if campaign.status != CampaignStatus::Draft {
            return Err(AppError::Conflict(format!(
                "Campaign template can only be edited in draft (status is {})",
                campaign.status
            )));
        }

        let applied = self
            .store
            .update_campaign_template(campaign_id, &caller.user_id, &req.subject, &req.body)
            .await?;
        if !applied {
            // Otro batch la sacó de draft entre la lectura y el update.
            return Err(AppError::Conflict(
                "Campaign is no longer in draft".to_string(),
            ));
        }

        self.owned_campaign(caller, campaign_id).await
    }

    pub async fn list_campaigns(&self, caller: &CallerIdentity) -> Result<Vec<Campaign>, AppError> {
        Ok(self.store.list_campaigns(&caller.user_id).await?)
    }

    pub async fn campaign_detail(
        &self,
        caller: &CallerIdentity,
        campaign_id: &str,
    ) -> Result<CampaignDetailResponse, AppError> {
        let campaign = self.owned_campaign(caller, campaign_id).await?;
        let contacts = self.store.count_contacts_by_status(&campaign.id).await?;
        Ok(CampaignDetailResponse { campaign, contacts })
    }

    pub async fn list_contacts(
        &self,
        caller: &CallerIdentity,
        campaign_id: &str,
    ) -> Result<Vec<Contact>, AppError> {
        let campaign = self.owned_campaign(caller, campaign_id).await?;
        Ok(self.store.list_contacts(&campaign.id).await?)
    }

    async fn owned_campaign(
        &self,
        caller: &CallerIdentity,
        campaign_id: &str,
    ) -> Result<Campaign, AppError> {
        self.store
            .get_campaign(campaign_id, &caller.user_id)
            .await?
            .ok_or_else(AppError::campaign_not_found)
    }
}
