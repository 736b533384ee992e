// [libs/domain/energy/src/errors.rs]
use thiserror::Error;

/// Catálogo de fallos del Ledger de Energía.
#[derive(Error, Debug)]
pub enum EnergyError {
    #[error("[L2_ENERGY_FAULT]: UNKNOWN_ACTION -> {0}")]
    UnknownAction(String),

    #[error("[L2_ENERGY_FAULT]: UNKNOWN_PACK -> {0}")]
    UnknownPack(String),

    #[error("[L2_ENERGY_FAULT]: INSUFFICIENT_ENERGY -> required={required}, current={current}, deficit={deficit}, suggested_pack={suggested_pack}")]
    InsufficientEnergy { required: f64, current: f64, deficit: f64, suggested_pack: &'static str },

    #[error("[L2_ENERGY_FAULT]: PURCHASE_FORBIDDEN_UNLIMITED_USER")]
    PurchaseForbidden,

    #[error("[L2_ENERGY_FAULT]: CONCURRENCY_EXHAUSTED -> retries={attempts}")]
    ConcurrencyExhausted { attempts: u32 },

    #[error("[L2_ENERGY_FAULT]: STORE_UNAVAILABLE -> {0}")]
    StoreUnavailable(String),
}
