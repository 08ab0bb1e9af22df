use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::models::contact_model::NewContact;

/// Ciclo de vida de una campaña.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Sending,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Sending => "sending",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "sending" => Ok(CampaignStatus::Sending),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(anyhow!("unknown campaign status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub status: CampaignStatus,
    pub sent_count: i64,
    pub failed_count: i64,
    pub total_contacts: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Campaign {
    /// Contactos ya procesados (enviados o fallidos).
    pub fn processed(&self) -> i64 {
        self.sent_count + self.failed_count
    }
}

/// Paso de "upload": la campaña nace en draft con sus contactos.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub contacts: Vec<NewContact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTemplateRequest {
    pub subject: String,
    pub body: String,
}

/// Conteo de contactos por estado, para el polling del dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactStatusCounts {
    pub pending: i64,
    pub processing: i64,
    pub sent: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetailResponse {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub contacts: ContactStatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCampaignsResponse {
    pub total: usize,
    pub items: Vec<Campaign>,
}
