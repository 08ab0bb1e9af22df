//! services/settings_service.rs

use std::sync::Arc;

use crate::{
    errors::AppError,
    models::settings_model::{SaveSettingsRequest, SenderSettings, SettingsResponse, DEFAULT_PROVIDER},
    services::{auth_service::CallerIdentity, contact_store::ContactStore},
};

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn ContactStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }

    pub async fn get_settings(&self, caller: &CallerIdentity) -> Result<SettingsResponse, AppError> {
        let settings = self.store.get_sender_settings(&caller.user_id).await?;
        Ok(SettingsResponse::from_settings(settings.as_ref()))
    }

    /// Upsert de settings. `api_key` ausente conserva la anterior.
    pub async fn save_settings(
        &self,
        caller: &CallerIdentity,
        req: SaveSettingsRequest,
    ) -> Result<SettingsResponse, AppError> {
        let current = self.store.get_sender_settings(&caller.user_id).await?;

        let api_key = match req.api_key {
            Some(key) => Some(key.trim().to_string()).filter(|k| !k.is_empty()),
            None => current.as_ref().and_then(|c| c.api_key.clone()),
        };

        let settings = SenderSettings {
            user_id: caller.user_id.clone(),
            api_key,
            email_service_provider: current
                .and_then(|c| c.email_service_provider)
                .or_else(|| Some(DEFAULT_PROVIDER.to_string())),
            from_email: req.from_email.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
            from_name: req.from_name.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        };

        self.store.upsert_sender_settings(&settings).await?;
        log::info!("Sender settings saved for user {}", caller.user_id);

        Ok(SettingsResponse::from_settings(Some(&settings)))
    }
}
