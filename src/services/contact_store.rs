//! services/contact_store.rs
//! Acceso tipado a campañas, contactos y settings de envío sobre SQLite.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::models::{
    campaign_model::{Campaign, CampaignStatus, ContactStatusCounts},
    contact_model::{Contact, ContactStatus, NewContact},
    settings_model::SenderSettings,
};

/// Datos para crear una campaña junto con sus contactos.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub user_id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub contacts: Vec<NewContact>,
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn get_sender_settings(&self, user_id: &str) -> Result<Option<SenderSettings>>;

    async fn upsert_sender_settings(&self, settings: &SenderSettings) -> Result<()>;

    /// Solo devuelve la campaña si pertenece a `owner_id`.
    async fn get_campaign(&self, campaign_id: &str, owner_id: &str) -> Result<Option<Campaign>>;

    async fn list_campaigns(&self, owner_id: &str) -> Result<Vec<Campaign>>;

    async fn create_campaign(&self, new_campaign: NewCampaign) -> Result<Campaign>;

    /// Cambia asunto/cuerpo solo si la campaña sigue en draft. `false` si no aplicó.
    async fn update_campaign_template(
        &self,
        campaign_id: &str,
        owner_id: &str,
        subject: &str,
        body: &str,
    ) -> Result<bool>;

    /// Reclama hasta `limit` contactos pendientes (pending → processing) en orden de carga.
    async fn claim_pending_contacts(&self, campaign_id: &str, limit: u32) -> Result<Vec<Contact>>;

    async fn mark_contact_sent(&self, contact_id: &str, sent_at: DateTime<Utc>) -> Result<()>;

    async fn mark_contact_failed(&self, contact_id: &str, error_message: &str) -> Result<()>;

    /// Incremento atómico de contadores y transición de estado.
    async fn apply_batch_counters(
        &self,
        campaign_id: &str,
        sent: u32,
        failed: u32,
    ) -> Result<Campaign>;

    async fn list_contacts(&self, campaign_id: &str) -> Result<Vec<Contact>>;

    async fn count_contacts_by_status(&self, campaign_id: &str) -> Result<ContactStatusCounts>;
}

// ======================================================
// Filas crudas de SQLite, validadas al convertir
// ======================================================

const CAMPAIGN_COLUMNS: &str = "id, user_id, name, subject, body, status, sent_count, \
     failed_count, total_contacts, created_at, updated_at";

const CONTACT_COLUMNS: &str = "id, campaign_id, user_id, position, name, email, company, \
     role, status, sent_at, error_message, created_at, updated_at";

#[derive(Debug, FromRow)]
struct CampaignRow {
    id: String,
    user_id: String,
    name: String,
    subject: String,
    body: String,
    status: String,
    sent_count: i64,
    failed_count: i64,
    total_contacts: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = anyhow::Error;

    fn try_from(row: CampaignRow) -> Result<Self> {
        Ok(Campaign {
            status: row
                .status
                .parse::<CampaignStatus>()
                .with_context(|| format!("Invalid campaign row {}", row.id))?,
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            subject: row.subject,
            body: row.body,
            sent_count: row.sent_count,
            failed_count: row.failed_count,
            total_contacts: row.total_contacts,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ContactRow {
    id: String,
    campaign_id: String,
    user_id: String,
    position: i64,
    name: String,
    email: String,
    company: Option<String>,
    role: Option<String>,
    status: String,
    sent_at: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ContactRow> for Contact {
    type Error = anyhow::Error;

    fn try_from(row: ContactRow) -> Result<Self> {
        Ok(Contact {
            status: row
                .status
                .parse::<ContactStatus>()
                .with_context(|| format!("Invalid contact row {}", row.id))?,
            id: row.id,
            campaign_id: row.campaign_id,
            user_id: row.user_id,
            position: row.position,
            name: row.name,
            email: row.email,
            company: row.company,
            role: row.role,
            sent_at: row.sent_at,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SettingsRow {
    user_id: String,
    api_key: Option<String>,
    email_service_provider: Option<String>,
    from_email: Option<String>,
    from_name: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ======================================================
// Implementación SQLite
// ======================================================

#[derive(Clone, Debug)]
pub struct SqliteContactStore {
    db_pool: Pool<Sqlite>,
}

impl SqliteContactStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SqliteContactStore { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Failed to run outreach migrations")?;
        Ok(())
    }

    async fn get_campaign_by_id(&self, campaign_id: &str) -> Result<Campaign> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM email_campaigns WHERE id = ?1");
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(campaign_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch campaign")?
            .ok_or_else(|| anyhow!("Campaign {} not found", campaign_id))?;
        Campaign::try_from(row)
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn get_sender_settings(&self, user_id: &str) -> Result<Option<SenderSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT user_id, api_key, email_service_provider, from_email, from_name
            FROM user_settings
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to fetch sender settings")?;

        Ok(row.map(|r| SenderSettings {
            user_id: r.user_id,
            api_key: r.api_key,
            email_service_provider: r.email_service_provider,
            from_email: non_blank(r.from_email),
            from_name: non_blank(r.from_name),
        }))
    }

    async fn upsert_sender_settings(&self, settings: &SenderSettings) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO user_settings (
                user_id, api_key, email_service_provider, from_email, from_name,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (user_id) DO UPDATE SET
                api_key = excluded.api_key,
                email_service_provider = excluded.email_service_provider,
                from_email = excluded.from_email,
                from_name = excluded.from_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.user_id)
        .bind(&settings.api_key)
        .bind(&settings.email_service_provider)
        .bind(&settings.from_email)
        .bind(&settings.from_name)
        .bind(now)
        .execute(&self.db_pool)
        .await
        .context("Failed to upsert sender settings")?;

        Ok(())
    }

    async fn get_campaign(&self, campaign_id: &str, owner_id: &str) -> Result<Option<Campaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM email_campaigns WHERE id = ?1 AND user_id = ?2"
        );
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(campaign_id)
            .bind(owner_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch campaign")?;

        row.map(Campaign::try_from).transpose()
    }

    async fn list_campaigns(&self, owner_id: &str) -> Result<Vec<Campaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM email_campaigns \
             WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.db_pool)
            .await
            .context("Failed to list campaigns")?;

        rows.into_iter().map(Campaign::try_from).collect()
    }

    async fn create_campaign(&self, new_campaign: NewCampaign) -> Result<Campaign> {
        let campaign_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let total = new_campaign.contacts.len() as i64;

        let mut tx = self
            .db_pool
            .begin()
            .await
            .context("Failed to open transaction")?;

        sqlx::query(
            r#"
            INSERT INTO email_campaigns (
                id, user_id, name, subject, body, status,
                sent_count, failed_count, total_contacts, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, 'draft', 0, 0, ?6, ?7, ?7)
            "#,
        )
        .bind(&campaign_id)
        .bind(&new_campaign.user_id)
        .bind(&new_campaign.name)
        .bind(&new_campaign.subject)
        .bind(&new_campaign.body)
        .bind(total)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert campaign")?;

        for (position, contact) in new_campaign.contacts.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO email_contacts (
                    id, campaign_id, user_id, position, name, email, company, role,
                    status, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&campaign_id)
            .bind(&new_campaign.user_id)
            .bind(position as i64)
            .bind(contact.name.trim())
            .bind(contact.email.trim())
            .bind(non_blank(contact.company.clone()))
            .bind(non_blank(contact.role.clone()))
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert contacts")?;
        }

        tx.commit().await.context("Failed to commit campaign")?;

        self.get_campaign_by_id(&campaign_id).await
    }

    async fn update_campaign_template(
        &self,
        campaign_id: &str,
        owner_id: &str,
        subject: &str,
        body: &str,
    ) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE email_campaigns
            SET subject = ?1,
                body = ?2,
                updated_at = ?3
            WHERE id = ?4 AND user_id = ?5 AND status = 'draft'
            "#,
        )
        .bind(subject)
        .bind(body)
        .bind(now)
        .bind(campaign_id)
        .bind(owner_id)
        .execute(&self.db_pool)
        .await
        .context("Failed to update campaign template")?;

        Ok(result.rows_affected() == 1)
    }

    async fn claim_pending_contacts(&self, campaign_id: &str, limit: u32) -> Result<Vec<Contact>> {
        let now = Utc::now().to_rfc3339();
        // Un solo UPDATE: dos batches concurrentes nunca reciben el mismo contacto.
        let sql = format!(
            r#"
            UPDATE email_contacts
            SET status = 'processing',
                updated_at = ?1
            WHERE id IN (
                SELECT id FROM email_contacts
                WHERE campaign_id = ?2 AND status = 'pending'
                ORDER BY position
                LIMIT ?3
            )
            RETURNING {CONTACT_COLUMNS}
            "#
        );

        let rows = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(now)
            .bind(campaign_id)
            .bind(i64::from(limit))
            .fetch_all(&self.db_pool)
            .await
            .context("Failed to fetch contacts")?;

        let mut contacts = rows
            .into_iter()
            .map(Contact::try_from)
            .collect::<Result<Vec<_>>>()?;
        // RETURNING no garantiza orden
        contacts.sort_by_key(|c| c.position);
        Ok(contacts)
    }

    async fn mark_contact_sent(&self, contact_id: &str, sent_at: DateTime<Utc>) -> Result<()> {
        let sent_at = sent_at.to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE email_contacts
            SET status = 'sent',
                sent_at = ?1,
                error_message = NULL,
                updated_at = ?1
            WHERE id = ?2 AND status = 'processing'
            "#,
        )
        .bind(sent_at)
        .bind(contact_id)
        .execute(&self.db_pool)
        .await
        .context("Failed to mark contact as sent")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Contact {} is not being processed", contact_id));
        }
        Ok(())
    }

    async fn mark_contact_failed(&self, contact_id: &str, error_message: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE email_contacts
            SET status = 'failed',
                error_message = ?1,
                updated_at = ?2
            WHERE id = ?3 AND status = 'processing'
            "#,
        )
        .bind(error_message)
        .bind(now)
        .bind(contact_id)
        .execute(&self.db_pool)
        .await
        .context("Failed to mark contact as failed")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Contact {} is not being processed", contact_id));
        }
        Ok(())
    }

    async fn apply_batch_counters(
        &self,
        campaign_id: &str,
        sent: u32,
        failed: u32,
    ) -> Result<Campaign> {
        let now = Utc::now().to_rfc3339();
        // En SQLite el lado derecho ve los valores previos de la fila.
        let sql = format!(
            r#"
            UPDATE email_campaigns
            SET sent_count = sent_count + ?1,
                failed_count = failed_count + ?2,
                status = CASE
                    WHEN sent_count + ?1 + failed_count + ?2 >= total_contacts THEN 'completed'
                    ELSE 'sending'
                END,
                updated_at = ?3
            WHERE id = ?4
            RETURNING {CAMPAIGN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(i64::from(sent))
            .bind(i64::from(failed))
            .bind(now)
            .bind(campaign_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to update campaign statistics")?
            .ok_or_else(|| anyhow!("Campaign {} disappeared during batch", campaign_id))?;

        Campaign::try_from(row)
    }

    async fn list_contacts(&self, campaign_id: &str) -> Result<Vec<Contact>> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM email_contacts WHERE campaign_id = ?1 ORDER BY position"
        );
        let rows = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(campaign_id)
            .fetch_all(&self.db_pool)
            .await
            .context("Failed to list contacts")?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    async fn count_contacts_by_status(&self, campaign_id: &str) -> Result<ContactStatusCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) AS cnt
            FROM email_contacts
            WHERE campaign_id = ?1
            GROUP BY status
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to count contacts")?;

        let mut counts = ContactStatusCounts::default();
        for (status, cnt) in rows {
            match status.parse::<ContactStatus>()? {
                ContactStatus::Pending => counts.pending = cnt,
                ContactStatus::Processing => counts.processing = cnt,
                ContactStatus::Sent => counts.sent = cnt,
                ContactStatus::Failed => counts.failed = cnt,
            }
        }
        Ok(counts)
    }
}
