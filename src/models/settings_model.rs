use serde::{Deserialize, Serialize};

pub const DEFAULT_PROVIDER: &str = "resend";

/// Configuración del remitente por usuario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderSettings {
    pub user_id: String,
    pub api_key: Option<String>,
    pub email_service_provider: Option<String>,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
}

impl SenderSettings {
    /// API key utilizable: presente y no vacía.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Dirección `from` final: "Nombre <correo>" si hay nombre.
    pub fn sender_address(&self, default_from_email: &str) -> String {
        let email = self
            .from_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(default_from_email);

        match self
            .from_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            Some(name) => format!("{name} <{email}>"),
            None => email.to_string(),
        }
    }
}

/// PUT /api/settings
///
/// `api_key` ausente conserva la guardada; cadena vacía la borra.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveSettingsRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
}

/// Vista pública: nunca devuelve la API key.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub has_api_key: bool,
    pub email_service_provider: String,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
}

impl SettingsResponse {
    pub fn from_settings(settings: Option<&SenderSettings>) -> Self {
        match settings {
            Some(s) => SettingsResponse {
                has_api_key: s.usable_api_key().is_some(),
                email_service_provider: s
                    .email_service_provider
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
                from_email: s.from_email.clone(),
                from_name: s.from_name.clone(),
            },
            None => SettingsResponse {
                has_api_key: false,
                email_service_provider: DEFAULT_PROVIDER.to_string(),
                from_email: None,
                from_name: None,
            },
        }
    }
}
