// [libs/infra/storage/src/repositories/events.rs]
/*!
 * APARATO: EVENT REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO NARRATIVO INMUTABLE Y SUMIDERO DE AUDITORIA
 *
 * Esta unica estructura satisface simultaneamente los puertos `EventSink`
 * del Ledger de energia, `EventSource`/`EnergyPlanProbe` del Analizador
 * Narrativo, `EventCounter`/`RateLimitAuditSink` del Rate Limiter, y
 * `TokenEventSink` del Servicio de Tokens: todos ellos, en el sistema de
 * origen, terminan escribiendo o leyendo la misma tabla `events`.
 */

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;
use luna_domain_models::Event;
use serde_json::Value;
use uuid::Uuid;

use crate::client::DurableStoreClient;
use crate::errors::StorageError;

pub struct EventRepository {
    client: Arc<DurableStoreClient>,
}

fn row_to_event(row: &libsql::Row) -> Result<Event, StorageError> {
    let event_id_raw: String = row.get(0).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let event_data_raw: String = row.get(4).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let metadata_raw: String = row.get(5).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let created_raw: String = row.get(6).map_err(|e| StorageError::Mapping(e.to_string()))?;
    Ok(Event {
        event_id: event_id_raw.parse().map_err(|e: uuid::Error| StorageError::Mapping(e.to_string()))?,
        user_id: row.get(1).map_err(|e| StorageError::Mapping(e.to_string()))?,
        event_type: row.get(2).map_err(|e| StorageError::Mapping(e.to_string()))?,
        app_source: row.get(3).map_err(|e| StorageError::Mapping(e.to_string()))?,
        event_data: serde_json::from_str(&event_data_raw).unwrap_or(Value::Null),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(Value::Null),
        created_at: created_raw.parse().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
    })
}

/// Nombre de servicio estampado en la procedencia de cada evento persistido.
const EVENT_SERVICE_PROVENANCE: &str = "luna-hub";
const EVENT_SCHEMA_VERSION: u32 = 1;

/// Funde la procedencia `{service, schema_version}` dentro de `metadata`
/// antes de persistir, sin pisar claves que el llamador ya hubiera fijado
/// bajo esos mismos nombres.
fn stamp_provenance(mut metadata: Value) -> Value {
    if !metadata.is_object() {
        metadata = Value::Object(serde_json::Map::new());
    }
    let map = metadata.as_object_mut().expect("stamped to object above");
    map.entry("service").or_insert_with(|| Value::String(EVENT_SERVICE_PROVENANCE.to_string()));
    map.entry("schema_version").or_insert_with(|| Value::from(EVENT_SCHEMA_VERSION));
    metadata
}

impl EventRepository {
    pub fn new(client: Arc<DurableStoreClient>) -> Self {
        Self { client }
    }

    pub async fn append_event(
        &self,
        user_id: &str,
        event_type: &str,
        app_source: &str,
        event_data: Value,
        metadata: Value,
    ) -> Result<Uuid, StorageError> {
        Event::validate_input(user_id, event_type, &event_data).map_err(StorageError::InvalidInput)?;

        let event_id = Uuid::new_v4();
        let created_at = Utc::now();
        let metadata = stamp_provenance(metadata);
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO events (event_id, user_id, event_type, app_source, event_data, metadata, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event_id.to_string(),
                user_id,
                event_type,
                app_source,
                event_data.to_string(),
                metadata.to_string(),
                created_at.to_rfc3339(),
            ],
        )
        .await?;
        Ok(event_id)
    }

    /// Consulta en orden cronologico inverso, opcionalmente filtrada por
    /// `event_type` y por una ventana temporal `since`.
    pub async fn query_events(
        &self,
        user_id: &str,
        limit: u32,
        event_type: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, StorageError> {
        let conn = self.client.get_connection()?;
        let mut rows = match (event_type, since) {
            (Some(event_type), Some(since)) => {
                conn.query(
                    "SELECT event_id, user_id, event_type, app_source, event_data, metadata, created_at FROM events \
                     WHERE user_id = ?1 AND event_type = ?2 AND created_at >= ?3 ORDER BY created_at DESC LIMIT ?4",
                    params![user_id, event_type, since.to_rfc3339(), limit],
                )
                .await?
            }
            (Some(event_type), None) => {
                conn.query(
                    "SELECT event_id, user_id, event_type, app_source, event_data, metadata, created_at FROM events \
                     WHERE user_id = ?1 AND event_type = ?2 ORDER BY created_at DESC LIMIT ?3",
                    params![user_id, event_type, limit],
                )
                .await?
            }
            (None, Some(since)) => {
                conn.query(
                    "SELECT event_id, user_id, event_type, app_source, event_data, metadata, created_at FROM events \
                     WHERE user_id = ?1 AND created_at >= ?2 ORDER BY created_at DESC LIMIT ?3",
                    params![user_id, since.to_rfc3339(), limit],
                )
                .await?
            }
            (None, None) => {
                conn.query(
                    "SELECT event_id, user_id, event_type, app_source, event_data, metadata, created_at FROM events \
                     WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
                    params![user_id, limit],
                )
                .await?
            }
        };

        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(row_to_event(&row)?);
        }
        Ok(events)
    }

    /// Busca un evento especifico por id, usado por el pipeline de
    /// reembolso para validar propiedad y elegibilidad.
    pub async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StorageError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT event_id, user_id, event_type, app_source, event_data, metadata, created_at FROM events WHERE event_id = ?1",
                params![event_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_event(&row)?)),
            None => Ok(None),
        }
    }

    /// Busca un `EnergyRefunded` previo que ya referencie este evento
    /// original, para la idempotencia cruzada del pipeline de reembolso.
    pub async fn find_refund_referencing(&self, original_event_id: Uuid) -> Result<Option<Event>, StorageError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT event_id, user_id, event_type, app_source, event_data, metadata, created_at FROM events \
                 WHERE event_type = 'EnergyRefunded' AND json_extract(event_data, '$.original_action_event_id') = ?1 LIMIT 1",
                params![original_event_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_event(&row)?)),
            None => Ok(None),
        }
    }

    /// Busca un `EnergyPurchased` previo referenciando el mismo intent de
    /// pago, para la idempotencia de confirmacion de billing.
    pub async fn find_purchase_referencing_intent(&self, intent_id: &str) -> Result<Option<Event>, StorageError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT event_id, user_id, event_type, app_source, event_data, metadata, created_at FROM events \
                 WHERE event_type = 'EnergyPurchased' AND json_extract(event_data, '$.intent_id') = ?1 LIMIT 1",
                params![intent_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_event(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl luna_domain_energy::EventSink for EventRepository {
    async fn append(
        &self,
        user_id: &str,
        event_type: &str,
        app_source: &str,
        event_data: Value,
        metadata: Value,
    ) -> Result<Uuid, luna_domain_energy::EnergyError> {
        self.append_event(user_id, event_type, app_source, event_data, metadata).await.map_err(Into::into)
    }
}

#[async_trait]
impl luna_domain_narrative::EventSource for EventRepository {
    async fn fetch_user_events(&self, user_id: &str, limit: u32) -> Result<Vec<Event>, luna_domain_narrative::NarrativeError> {
        self.query_events(user_id, limit, None, None).await.map_err(Into::into)
    }
}

#[async_trait]
impl luna_domain_tokens::TokenEventSink for EventRepository {
    async fn append(&self, user_id: &str, event_type: &str, event_data: Value) -> Result<Uuid, luna_domain_tokens::TokenError> {
        self.append_event(user_id, event_type, "luna-hub", event_data, Value::Null).await.map_err(Into::into)
    }
}

#[async_trait]
impl luna_domain_ratelimit::EventCounter for EventRepository {
    async fn count_recent_attempts(
        &self,
        scope: luna_domain_ratelimit::RateLimitScope,
        identifier: &str,
        since: DateTime<Utc>,
        scan_limit: u32,
    ) -> Result<u32, luna_domain_ratelimit::RateLimitError> {
        // Degradacion de respaldo: escanea eventos `rate_limited` recientes
        // acotados a `scan_limit` filas, nunca toda la tabla.
        let conn = self.client.get_connection().map_err(|e| luna_domain_ratelimit::RateLimitError::CacheUnavailable(e.to_string()))?;
        let mut rows = conn
            .query(
                "SELECT event_data FROM events WHERE event_type = 'rate_limited' AND created_at >= ?1 ORDER BY created_at DESC LIMIT ?2",
                params![since.to_rfc3339(), scan_limit],
            )
            .await
            .map_err(|e| luna_domain_ratelimit::RateLimitError::CacheUnavailable(e.to_string()))?;

        let scope_tag = scope.as_str();
        let mut count = 0u32;
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| luna_domain_ratelimit::RateLimitError::CacheUnavailable(e.to_string()))?
        {
            let raw: String = row.get(0).unwrap_or_default();
            if let Ok(data) = serde_json::from_str::<Value>(&raw) {
                if data.get("scope").and_then(|v| v.as_str()) == Some(scope_tag)
                    && data.get("identifier").and_then(|v| v.as_str()) == Some(identifier)
                {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl luna_domain_ratelimit::RateLimitAuditSink for EventRepository {
    async fn record_attempt(
        &self,
        _scope: luna_domain_ratelimit::RateLimitScope,
        _identifier: &str,
        _strategy: luna_domain_ratelimit::RateLimitStrategy,
    ) -> Result<(), luna_domain_ratelimit::RateLimitError> {
        // Deliberadamente no persistido: auditar cada intento permitido
        // convertiria la tabla de eventos en el cuello de botella de
        // escritura del hot path. Solo los bloqueos se registran.
        Ok(())
    }

    async fn record_limited(
        &self,
        scope: luna_domain_ratelimit::RateLimitScope,
        identifier: &str,
        blocked_until: DateTime<Utc>,
    ) -> Result<(), luna_domain_ratelimit::RateLimitError> {
        self.append_event(
            identifier,
            "rate_limited",
            "luna-hub",
            serde_json::json!({
                "scope": scope.as_str(),
                "identifier": identifier,
                "blocked_until": blocked_until.to_rfc3339(),
            }),
            Value::Null,
        )
        .await
        .map_err(|e| luna_domain_ratelimit::RateLimitError::AuditFailure(e.to_string()))?;
        Ok(())
    }
}
