// [libs/infra/storage/src/errors.rs]
/*!
 * APARATO: DURABLE STORE FAULTS (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACION SEMANTICA DE FALLOS DE PERSISTENCIA
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("[L3_STORE_FAULT] fallo de enlace con la base de datos: {0}")]
    Connection(String),

    #[error("[L3_STORE_FAULT] variable de entorno de configuracion ausente o invalida: {0}")]
    Configuration(String),

    #[error("[L3_STORE_FAULT] consulta rechazada por el motor: {0}")]
    Query(#[from] libsql::Error),

    #[error("[L3_STORE_FAULT] fallo de mapeo entre fila SQL y tipo de dominio: {0}")]
    Mapping(String),

    #[error("[L3_STORE_FAULT] registro no encontrado")]
    NotFound,

    #[error("[L3_STORE_FAULT] entrada invalida: {0}")]
    InvalidInput(String),
}

impl From<StorageError> for luna_domain_energy::EnergyError {
    fn from(err: StorageError) -> Self {
        luna_domain_energy::EnergyError::StoreUnavailable(err.to_string())
    }
}

impl From<StorageError> for luna_domain_narrative::NarrativeError {
    fn from(err: StorageError) -> Self {
        luna_domain_narrative::NarrativeError::EventSourceUnavailable(err.to_string())
    }
}

impl From<StorageError> for luna_domain_ratelimit::RateLimitError {
    fn from(err: StorageError) -> Self {
        luna_domain_ratelimit::RateLimitError::BlockPersistence(err.to_string())
    }
}

impl From<StorageError> for luna_domain_tokens::TokenError {
    fn from(err: StorageError) -> Self {
        luna_domain_tokens::TokenError::StoreUnavailable(err.to_string())
    }
}
