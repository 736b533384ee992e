// [libs/infra/cache/src/errors.rs]
/*!
 * APARATO: CACHE ADAPTER FAULTS (ESTRATO L1)
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("[L1_CACHE_FAULT] fallo de conexion a Redis: {0}")]
    Connection(String),

    #[error("[L1_CACHE_FAULT] fallo ejecutando script Lua: {0}")]
    ScriptFailure(String),

    #[error("[L1_CACHE_FAULT] fallo de (de)serializacion: {0}")]
    Serialization(String),
}

impl From<CacheError> for luna_domain_ratelimit::RateLimitError {
    fn from(err: CacheError) -> Self {
        luna_domain_ratelimit::RateLimitError::CacheUnavailable(err.to_string())
    }
}
