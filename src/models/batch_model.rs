use serde::{Deserialize, Serialize};

/// POST /api/send-bulk-emails
#[derive(Debug, Clone, Deserialize)]
pub struct SendBatchRequest {
    pub campaign_id: String,
    #[serde(default)]
    pub batch_size: Option<u32>,
}

/// Resultado de una invocación del dispatcher. No se persiste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub message: String,
    pub sent: u32,
    pub failed: u32,
}

impl BatchResult {
    pub fn empty() -> Self {
        BatchResult {
            message: "No pending emails to send".to_string(),
            sent: 0,
            failed: 0,
        }
    }

    pub fn complete(sent: u32, failed: u32) -> Self {
        BatchResult {
            message: "Batch processing complete".to_string(),
            sent,
            failed,
        }
    }
}
