// [libs/domain/narrative/src/ports.rs]
/*!
 * APARATO: NARRATIVE ANALYZER PORTS (ESTRATO L2 - PUERTOS HEXAGONALES)
 * RESPONSABILIDAD: CONTRATOS QUE LA INFRAESTRUCTURA DEBE SATISFACER
 */

use async_trait::async_trait;
use luna_domain_models::Event;

use crate::errors::NarrativeError;
use crate::types::ContextPacket;

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Devuelve los eventos mas recientes de un usuario, acotados a `limit`
    /// filas. El analizador aplica su propio recorte temporal encima de
    /// este resultado; el puerto solo garantiza el orden por recencia.
    async fn fetch_user_events(&self, user_id: &str, limit: u32) -> Result<Vec<Event>, NarrativeError>;
}

/// Consulta de solo lectura al Ledger de energia para la deteccion robusta
/// de plan: el metodo mas confiable es preguntar directamente si el
/// usuario tiene suscripcion ilimitada, antes de caer a heuristicas sobre
/// los propios eventos.
#[async_trait]
pub trait EnergyPlanProbe: Send + Sync {
    async fn is_unlimited_user(&self, user_id: &str) -> Result<bool, NarrativeError>;
}

#[async_trait]
pub trait ContextCache: Send + Sync {
    async fn get(&self, user_id: &str) -> Option<ContextPacket>;
    async fn put(&self, user_id: &str, packet: &ContextPacket);
    async fn invalidate(&self, user_id: &str);
}
