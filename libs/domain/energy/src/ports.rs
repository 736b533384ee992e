// [libs/domain/energy/src/ports.rs]
/*!
 * APARATO: ENERGY LEDGER PORTS (ESTRATO L2 - PUERTOS HEXAGONALES)
 * RESPONSABILIDAD: CONTRATOS QUE LA INFRAESTRUCTURA DEBE SATISFACER
 *
 * El Ledger de Energía es puro: no conoce Turso, Redis, ni HTTP. Define
 * aquí los contratos mínimos que una adaptación de infraestructura debe
 * cumplir para que la aritmética de negocio sea ejecutable y testeable
 * con dobles de prueba en memoria.
 */

use crate::errors::EnergyError;
use crate::types::{EnergyTransaction, UserEnergy};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Persistencia del balance energético, con control de concurrencia
/// optimista: la escritura sólo se compromete si nadie más mutó la fila
/// desde la lectura (`save_if_unchanged` compara `updated_at`).
#[async_trait]
pub trait EnergyStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<UserEnergy, EnergyError>;

    /// Intenta comprometer `updated` partiendo de la versión `expected`
    /// leída previamente. Devuelve `Ok(false)` en caso de conflicto de
    /// concurrencia (otro escritor ganó la carrera), nunca un error.
    async fn save_if_unchanged(
        &self,
        expected: &UserEnergy,
        updated: &UserEnergy,
    ) -> Result<bool, EnergyError>;

    async fn record_transaction(&self, transaction: &EnergyTransaction) -> Result<(), EnergyError>;

    /// Cuenta compras previas (transacciones `purchase`) del usuario, usado
    /// para decidir elegibilidad de la bonificación de primera compra.
    async fn count_prior_purchases(&self, user_id: &str) -> Result<u32, EnergyError>;
}

/// Sumidero de eventos narrativos. El Ledger nunca lee el registro, sólo
/// añade hechos consumados.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn append(
        &self,
        user_id: &str,
        event_type: &str,
        app_source: &str,
        event_data: Value,
        metadata: Value,
    ) -> Result<Uuid, EnergyError>;
}

/// Invalidación de cache de lectura sobre el balance energético. Opcional:
/// un Ledger sin cache configurado simplemente no invalida nada.
#[async_trait]
pub trait EnergyCache: Send + Sync {
    async fn invalidate_user_energy(&self, user_id: &str);
}
