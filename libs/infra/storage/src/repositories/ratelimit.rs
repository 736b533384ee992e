// [libs/infra/storage/src/repositories/ratelimit.rs]
/*!
 * APARATO: RATE LIMIT BLOCK REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: DIRECTORIO PERSISTENTE DE BLOQUEOS POR (AMBITO, HASH)
 *
 * El identificador crudo (IP, user_id, email) nunca se persiste aqui: el
 * limitador ya entrega `identifier_hash`, el prefijo sha256 truncado, y
 * esta tabla solo conoce esa forma opaca.
 */

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;
use luna_domain_ratelimit::{BlockRecord, RateLimitError, RateLimitScope};

use crate::client::DurableStoreClient;
use crate::errors::StorageError;

pub struct BlockRepository {
    client: Arc<DurableStoreClient>,
}

fn scope_from_str(raw: &str) -> Option<RateLimitScope> {
    use RateLimitScope::*;
    Some(match raw {
        "auth_login" => AuthLogin,
        "auth_register" => AuthRegister,
        "password_reset" => PasswordReset,
        "api_general" => ApiGeneral,
        "api_energy" => ApiEnergy,
        "api_cv_generation" => ApiCvGeneration,
        "api_letter_generation" => ApiLetterGeneration,
        "api_luna_chat" => ApiLunaChat,
        "admin_operations" => AdminOperations,
        "global_ddos" => GlobalDdos,
        "ip_general" => IpGeneral,
        "user_general" => UserGeneral,
        _ => return None,
    })
}

fn row_to_block(row: &libsql::Row) -> Result<BlockRecord, StorageError> {
    let scope_raw: String = row.get(0).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let blocked_until_raw: String = row.get(2).map_err(|e| StorageError::Mapping(e.to_string()))?;
    Ok(BlockRecord {
        scope: scope_from_str(&scope_raw).ok_or_else(|| StorageError::Mapping(format!("ambito desconocido: {scope_raw}")))?,
        identifier_hash: row.get(1).map_err(|e| StorageError::Mapping(e.to_string()))?,
        blocked_until: blocked_until_raw.parse().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
        block_duration_seconds: row.get::<i64>(3).map_err(|e| StorageError::Mapping(e.to_string()))? as u32,
    })
}

impl BlockRepository {
    pub fn new(client: Arc<DurableStoreClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl luna_domain_ratelimit::BlockRecordStore for BlockRepository {
    async fn get_block(&self, scope: RateLimitScope, identifier_hash: &str) -> Result<Option<BlockRecord>, RateLimitError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| RateLimitError::BlockPersistence(e.to_string()))?;
        let mut rows = conn
            .query(
                "SELECT scope, identifier_hash, blocked_until, block_duration_seconds FROM rate_limits WHERE scope = ?1 AND identifier_hash = ?2",
                params![scope.as_str(), identifier_hash],
            )
            .await
            .map_err(|e| RateLimitError::BlockPersistence(e.to_string()))?;
        match rows.next().await.map_err(|e| RateLimitError::BlockPersistence(e.to_string()))? {
            Some(row) => Ok(Some(row_to_block(&row).map_err(|e| RateLimitError::BlockPersistence(e.to_string()))?)),
            None => Ok(None),
        }
    }

    async fn upsert_block(&self, record: &BlockRecord) -> Result<(), RateLimitError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| RateLimitError::BlockPersistence(e.to_string()))?;
        conn.execute(
            "INSERT INTO rate_limits (scope, identifier_hash, blocked_until, block_duration_seconds) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(scope, identifier_hash) DO UPDATE SET blocked_until = excluded.blocked_until, block_duration_seconds = excluded.block_duration_seconds",
            params![
                record.scope.as_str(),
                record.identifier_hash.clone(),
                record.blocked_until.to_rfc3339(),
                record.block_duration_seconds,
            ],
        )
        .await
        .map_err(|e| RateLimitError::BlockPersistence(e.to_string()))?;
        Ok(())
    }

    async fn delete_block(&self, scope: RateLimitScope, identifier_hash: &str) -> Result<(), RateLimitError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| RateLimitError::BlockPersistence(e.to_string()))?;
        conn.execute(
            "DELETE FROM rate_limits WHERE scope = ?1 AND identifier_hash = ?2",
            params![scope.as_str(), identifier_hash],
        )
        .await
        .map_err(|e| RateLimitError::BlockPersistence(e.to_string()))?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RateLimitError> {
        let conn = self.client.get_connection().map_err(|e: StorageError| RateLimitError::BlockPersistence(e.to_string()))?;
        let affected = conn
            .execute("DELETE FROM rate_limits WHERE blocked_until < ?1", params![now.to_rfc3339()])
            .await
            .map_err(|e| RateLimitError::BlockPersistence(e.to_string()))?;
        Ok(affected)
    }
}
