// [libs/infra/storage/src/repositories/sessions.rs]
/*!
 * APARATO: SESSION REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE SESIONES Y ROTACION DE REFRESH TOKENS
 *
 * El sistema de origen separaba `refresh_tokens` y `sessions` en dos
 * tablas ligadas 1:1; aqui ambas se colapsan en la tabla unica `sessions`
 * tal como ya anticipa el puerto `SessionStore` del dominio.
 */

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;
use luna_domain_tokens::{SessionRecord, TokenError};
use uuid::Uuid;

use crate::client::DurableStoreClient;
use crate::errors::StorageError;

pub struct SessionRepository {
    client: Arc<DurableStoreClient>,
}

fn row_to_session(row: &libsql::Row) -> Result<SessionRecord, StorageError> {
    let id_raw: String = row.get(0).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let parent_raw: Option<String> = row.get(7).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let expires_raw: String = row.get(8).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let used_raw: Option<String> = row.get(9).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let revoked_raw: Option<String> = row.get(10).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let created_raw: String = row.get(11).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let last_seen_raw: String = row.get(12).map_err(|e| StorageError::Mapping(e.to_string()))?;

    Ok(SessionRecord {
        id: id_raw.parse().map_err(|e: uuid::Error| StorageError::Mapping(e.to_string()))?,
        user_id: row.get(1).map_err(|e| StorageError::Mapping(e.to_string()))?,
        token_hash: row.get(2).map_err(|e| StorageError::Mapping(e.to_string()))?,
        jti: row.get(3).map_err(|e| StorageError::Mapping(e.to_string()))?,
        device_label: row.get(4).map_err(|e| StorageError::Mapping(e.to_string()))?,
        user_agent: row.get(5).map_err(|e| StorageError::Mapping(e.to_string()))?,
        ip: row.get(6).map_err(|e| StorageError::Mapping(e.to_string()))?,
        parent_id: parent_raw.map(|raw| raw.parse()).transpose().map_err(|e: uuid::Error| StorageError::Mapping(e.to_string()))?,
        expires_at: expires_raw.parse().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
        used_at: used_raw.map(|raw| raw.parse()).transpose().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
        revoked_at: revoked_raw.map(|raw| raw.parse()).transpose().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
        created_at: created_raw.parse().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
        last_seen: last_seen_raw.parse().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
    })
}

const SESSION_COLUMNS: &str =
    "id, user_id, token_hash, jti, device_label, user_agent, ip, parent_id, expires_at, used_at, revoked_at, created_at, last_seen";

impl SessionRepository {
    pub fn new(client: Arc<DurableStoreClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl luna_domain_tokens::SessionStore for SessionRepository {
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
    ) -> Result<SessionRecord, TokenError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| TokenError::StoreUnavailable(e.to_string()))?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO sessions (id, user_id, token_hash, jti, device_label, user_agent, ip, parent_id, expires_at, used_at, revoked_at, created_at, last_seen) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, NULL, ?10, ?11)",
            params![
                id.to_string(),
                user_id,
                token_hash,
                jti,
                device_label,
                user_agent,
                ip,
                parent_id.map(|p| p.to_string()),
                expires_at.to_rfc3339(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?;

        Ok(SessionRecord {
            id,
            user_id: user_id.to_string(),
            token_hash: token_hash.to_string(),
            jti: jti.to_string(),
            device_label: device_label.to_string(),
            user_agent: user_agent.to_string(),
            ip: ip.to_string(),
            parent_id,
            expires_at,
            used_at: None,
            revoked_at: None,
            created_at: now,
            last_seen: now,
        })
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<SessionRecord>, TokenError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| TokenError::StoreUnavailable(e.to_string()))?;
        let mut rows = conn
            .query(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_hash = ?1"), params![token_hash])
            .await
            .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?;
        match rows.next().await.map_err(|e| TokenError::StoreUnavailable(e.to_string()))? {
            Some(row) => Ok(Some(row_to_session(&row).map_err(|e| TokenError::StoreUnavailable(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>, TokenError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| TokenError::StoreUnavailable(e.to_string()))?;
        let mut rows = conn
            .query(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"), params![id.to_string()])
            .await
            .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?;
        match rows.next().await.map_err(|e| TokenError::StoreUnavailable(e.to_string()))? {
            Some(row) => Ok(Some(row_to_session(&row).map_err(|e| TokenError::StoreUnavailable(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), TokenError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| TokenError::StoreUnavailable(e.to_string()))?;
        let now = Utc::now();
        conn.execute(
            "UPDATE sessions SET used_at = ?1, last_seen = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id.to_string()],
        )
        .await
        .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn revoke(&self, id: Uuid) -> Result<(), TokenError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| TokenError::StoreUnavailable(e.to_string()))?;
        conn.execute(
            "UPDATE sessions SET revoked_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id.to_string()],
        )
        .await
        .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &str, except: Option<Uuid>) -> Result<u32, TokenError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| TokenError::StoreUnavailable(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        let affected = match except {
            Some(except_id) => conn
                .execute(
                    "UPDATE sessions SET revoked_at = ?1 WHERE user_id = ?2 AND revoked_at IS NULL AND id != ?3",
                    params![now, user_id, except_id.to_string()],
                )
                .await
                .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?,
            None => conn
                .execute(
                    "UPDATE sessions SET revoked_at = ?1 WHERE user_id = ?2 AND revoked_at IS NULL",
                    params![now, user_id],
                )
                .await
                .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?,
        };
        Ok(affected as u32)
    }

    async fn list_active_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, TokenError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| TokenError::StoreUnavailable(e.to_string()))?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = ?1 AND revoked_at IS NULL AND expires_at > ?2 ORDER BY last_seen DESC"
                ),
                params![user_id, Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| TokenError::StoreUnavailable(e.to_string()))?;

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| TokenError::StoreUnavailable(e.to_string()))? {
            sessions.push(row_to_session(&row).map_err(|e| TokenError::StoreUnavailable(e.to_string()))?);
        }
        Ok(sessions)
    }
}
