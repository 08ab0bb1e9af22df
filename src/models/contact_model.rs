use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Estado de entrega de un contacto.
///
/// `Processing` es el estado de reclamo: un batch lo toma de `Pending` y lo
/// deja en `Sent` o `Failed`. Nunca vuelve a `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Processing => "processing",
            ContactStatus::Sent => "sent",
            ContactStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContactStatus::Pending),
            "processing" => Ok(ContactStatus::Processing),
            "sent" => Ok(ContactStatus::Sent),
            "failed" => Ok(ContactStatus::Failed),
            other => Err(anyhow!("unknown contact status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: String,
    pub campaign_id: String,
    pub user_id: String,
    pub position: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: ContactStatus,
    pub sent_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fila de contacto tal como llega del CSV ya parseado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListContactsResponse {
    pub total: usize,
    pub items: Vec<Contact>,
}
