// [libs/domain/ratelimit/src/ports.rs]
/*!
 * APARATO: RATE LIMITER PORTS (ESTRATO L2 - PUERTOS HEXAGONALES)
 * RESPONSABILIDAD: CONTRATOS QUE LA INFRAESTRUCTURA DEBE SATISFACER
 *
 * El limitador es puro: desconoce Redis y Turso. Declara aqui los tres
 * contratos que necesita para operar: un backend de scripting atomico
 * (la pieza que realmente frena una carrera), un directorio de registros
 * de bloqueo persistentes, y un sumidero de auditoria. Un cuarto contrato,
 * `EventCounter`, permite degradar con gracia cuando el backend de cache
 * no responde: en vez de abrir la compuerta a ciegas, se reconstruye un
 * conteo aproximado a partir del registro de eventos acotado a 500 filas.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::RateLimitError;
use crate::types::{RateLimitScope, RateLimitStrategy};

/// Resultado crudo de una evaluacion de estrategia atomica.
#[derive(Debug, Clone, Copy)]
pub struct StrategyOutcome {
    pub allowed: bool,
    pub current_count: u32,
    pub limit: u32,
}

/// Backend de cache capaz de ejecutar las estrategias de forma atomica.
#[async_trait]
pub trait RateLimitCache: Send + Sync {
    async fn eval_sliding_window(
        &self,
        key: &str,
        window_seconds: u32,
        limit: u32,
        now_epoch_millis: i64,
        identifier: &str,
    ) -> Result<StrategyOutcome, RateLimitError>;

    async fn eval_token_bucket(
        &self,
        key: &str,
        capacity: u32,
        refill_rate: u32,
        window_seconds: u32,
        now_epoch_millis: i64,
        requested_tokens: u32,
    ) -> Result<StrategyOutcome, RateLimitError>;

    /// Ventana fija: incremento atomico con expiracion perezosa sobre el
    /// bucket vigente (la clave ya incluye el indice de ventana).
    async fn incr_fixed_window(&self, key: &str, ttl_seconds: u32) -> Result<u32, RateLimitError>;

    /// Conteo actual, usado por `get_rate_limit_status` sin mutar estado.
    async fn peek_count(&self, key: &str) -> Result<Option<u32>, RateLimitError>;

    async fn delete(&self, key: &str) -> Result<(), RateLimitError>;
}

/// Fila persistida cuando un identificador agota su cupo.
#[derive(Debug, Clone)]
pub struct BlockRecord {
    pub scope: RateLimitScope,
    pub identifier_hash: String,
    pub blocked_until: DateTime<Utc>,
    pub block_duration_seconds: u32,
}

#[async_trait]
pub trait BlockRecordStore: Send + Sync {
    async fn get_block(&self, scope: RateLimitScope, identifier_hash: &str) -> Result<Option<BlockRecord>, RateLimitError>;

    /// Upsert por (scope, identifier_hash): en conflicto, se reemplaza
    /// `blocked_until` por el valor mas reciente.
    async fn upsert_block(&self, record: &BlockRecord) -> Result<(), RateLimitError>;

    async fn delete_block(&self, scope: RateLimitScope, identifier_hash: &str) -> Result<(), RateLimitError>;

    /// Barrido de mantenimiento: elimina registros ya vencidos y devuelve
    /// cuantas filas fueron purgadas.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RateLimitError>;
}

#[async_trait]
pub trait RateLimitAuditSink: Send + Sync {
    async fn record_attempt(&self, scope: RateLimitScope, identifier: &str, strategy: RateLimitStrategy) -> Result<(), RateLimitError>;

    async fn record_limited(&self, scope: RateLimitScope, identifier: &str, blocked_until: DateTime<Utc>) -> Result<(), RateLimitError>;
}

/// Conteo degradado basado en el registro de eventos, usado solo cuando
/// el backend de cache falla. Acotado a un maximo de filas escaneadas para
/// no convertir una caida de Redis en una tormenta de lecturas a la base.
#[async_trait]
pub trait EventCounter: Send + Sync {
    async fn count_recent_attempts(
        &self,
        scope: RateLimitScope,
        identifier: &str,
        since: DateTime<Utc>,
        scan_limit: u32,
    ) -> Result<u32, RateLimitError>;
}
