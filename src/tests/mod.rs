//! tests/mod.rs
//! Pruebas del servicio: helpers compartidos y módulos por área.

mod handler_tests;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::config::app_config::DispatchConfig;
use crate::models::contact_model::NewContact;
use crate::models::settings_model::SenderSettings;
use crate::services::auth_service::TokenAuthenticator;
use crate::services::batch_service::BatchService;
use crate::services::contact_store::{ContactStore, NewCampaign, SqliteContactStore};
use crate::services::delivery_service::{
    DeliveryClient, DeliveryError, DeliveryReceipt, OutboundEmail,
};

pub const USER: &str = "user-1";
pub const TOKEN: &str = "token-user-1";
pub const OTHER_USER: &str = "user-2";
pub const OTHER_TOKEN: &str = "token-user-2";

/// Pool en memoria: una sola conexión que nunca se recicla.
pub async fn memory_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    SqliteContactStore::new(pool.clone())
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

/// Store + autenticador con dos usuarios registrados.
pub struct Fixture {
    pub pool: Pool<Sqlite>,
    pub store: Arc<SqliteContactStore>,
    pub auth: Arc<TokenAuthenticator>,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = memory_pool().await;
        let auth = TokenAuthenticator::new(pool.clone());
        auth.register_token(TOKEN, USER, None).await.unwrap();
        auth.register_token(OTHER_TOKEN, OTHER_USER, None)
            .await
            .unwrap();

        Fixture {
            store: Arc::new(SqliteContactStore::new(pool.clone())),
            auth: Arc::new(auth),
            pool,
        }
    }

    pub async fn configure_sender(&self, user_id: &str, api_key: Option<&str>) {
        self.store
            .upsert_sender_settings(&SenderSettings {
                user_id: user_id.to_string(),
                api_key: api_key.map(String::from),
                email_service_provider: Some("resend".to_string()),
                from_email: Some("team@acme.io".to_string()),
                from_name: Some("Acme".to_string()),
            })
            .await
            .unwrap();
    }

    /// Campaña con `n` contactos: contact0@example.com, contact1@...
    pub async fn campaign_with_contacts(&self, user_id: &str, n: usize) -> String {
        let contacts = (0..n)
            .map(|i| NewContact {
                name: format!("Contact {i}"),
                email: format!("contact{i}@example.com"),
                company: if i % 2 == 0 { Some("Acme".to_string()) } else { None },
                role: Some("CTO".to_string()),
            })
            .collect();

        self.store
            .create_campaign(NewCampaign {
                user_id: user_id.to_string(),
                name: "Launch".to_string(),
                subject: "Hi {name} from {company}".to_string(),
                body: "Hello {name},\nHow is {role} life at {company}?".to_string(),
                contacts,
            })
            .await
            .unwrap()
            .id
    }

    pub fn dispatcher(&self, delivery: Arc<dyn DeliveryClient>, config: DispatchConfig) -> BatchService {
        BatchService::new(self.auth.clone(), self.store.clone(), delivery, config)
    }
}

/// Cliente de entrega falso: registra los envíos y falla para las direcciones indicadas.
#[derive(Clone, Default)]
pub struct MockDelivery {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(self, address: &str) -> Self {
        self.failing.lock().unwrap().insert(address.to_string());
        self
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent().into_iter().map(|e| e.to).collect()
    }
}

#[async_trait]
impl DeliveryClient for MockDelivery {
    async fn send(
        &self,
        _api_key: &str,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        // Se registra cada intento, también los que fallan
        self.sent.lock().unwrap().push(email.clone());
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(DeliveryError::Rejected {
                status: 422,
                message: format!("Invalid `to` field: {}", email.to),
            });
        }
        Ok(DeliveryReceipt {
            id: Some(format!("msg-{}", email.to)),
        })
    }
}
