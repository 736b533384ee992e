// [libs/domain/tokens/src/ports.rs]
/*!
 * APARATO: TOKEN SERVICE PORTS (ESTRATO L2 - PUERTOS HEXAGONALES)
 * RESPONSABILIDAD: CONTRATOS DE PERSISTENCIA DE SESIONES Y AUDITORIA
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::TokenError;

/// Fila unificada de sesion + refresh token. El sistema de origen separaba
/// `refresh_tokens` y `sessions` en dos tablas ligadas 1:1; aqui se colapsan
/// en un unico registro por simplicidad sin perder ningun campo auditable.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub token_hash: String,
    pub jti: String,
    pub device_label: String,
    pub user_agent: String,
    pub ip: String,
    pub parent_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn create_session(
        &self,
        user_id: &str,
        token_hash: &str,
        jti: &str,
        device_label: &str,
        user_agent: &str,
        ip: &str,
        expires_at: DateTime<Utc>,
        parent_id: Option<Uuid>,
    ) -> Result<SessionRecord, TokenError>;

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<SessionRecord>, TokenError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>, TokenError>;

    async fn mark_used(&self, id: Uuid) -> Result<(), TokenError>;

    async fn revoke(&self, id: Uuid) -> Result<(), TokenError>;

    async fn revoke_all_for_user(&self, user_id: &str, except: Option<Uuid>) -> Result<u32, TokenError>;

    async fn list_active_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, TokenError>;
}

#[async_trait]
pub trait TokenEventSink: Send + Sync {
    async fn append(&self, user_id: &str, event_type: &str, event_data: Value) -> Result<Uuid, TokenError>;
}
