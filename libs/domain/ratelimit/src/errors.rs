// [libs/domain/ratelimit/src/errors.rs]
/*!
 * APARATO: RATE LIMIT FAULTS (ESTRATO L2)
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("[L2_RATELIMIT_FAULT] backend de cache no disponible: {0}")]
    CacheUnavailable(String),

    #[error("[L2_RATELIMIT_FAULT] fallo al persistir registro de bloqueo: {0}")]
    BlockPersistence(String),

    #[error("[L2_RATELIMIT_FAULT] fallo al anotar evento de auditoria: {0}")]
    AuditFailure(String),
}
