// [libs/domain/models/src/event.rs]
/*!
 * APARATO: EVENT ENVELOPE (ESTRATO L2 - DOMINIO COMPARTIDO)
 * RESPONSABILIDAD: DEFINICIÓN NOMINAL DEL EVENTO CANÓNICO DE NARRATIVA
 *
 * Todo lo que ocurre en el Hub se registra como un Evento. Ningún evento
 * se muta ni se elimina una vez comprometido: es la fuente única de verdad
 * para el Ledger de Energía y el Analizador Narrativo.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Tamaño máximo, en bytes del JSON serializado, que acepta `event_data`.
pub const MAX_EVENT_DATA_BYTES: usize = 5 * 1024;

/// Un evento inmutable perteneciente al registro narrativo de un usuario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub user_id: String,
    pub event_type: String,
    pub app_source: String,
    pub event_data: Value,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Valida los campos de entrada antes de comprometer el evento en el Ledger.
    ///
    /// # Errors:
    /// Retorna un mensaje descriptivo si el `user_id` está vacío, si el
    /// `event_type` está vacío, o si `event_data` excede el límite de tamaño.
    pub fn validate_input(
        user_id: &str,
        event_type: &str,
        event_data: &Value,
    ) -> Result<(), String> {
        if user_id.trim().is_empty() {
            return Err("user_id no puede estar vacío".into());
        }
        if event_type.trim().is_empty() {
            return Err("event_type no puede estar vacío".into());
        }
        let serialized_size = serde_json::to_vec(event_data)
            .map(|bytes| bytes.len())
            .unwrap_or(usize::MAX);
        if serialized_size > MAX_EVENT_DATA_BYTES {
            return Err(format!(
                "event_data excede el límite de {} bytes (recibidos {})",
                MAX_EVENT_DATA_BYTES, serialized_size
            ));
        }
        Ok(())
    }
}

/// Tipos de evento canónicos reconocidos por los componentes internos.
/// Las apps satélite pueden emitir tipos adicionales con prefijo propio
/// (`cv_*`, `letter_*`, `aube_*`); estos no están tipados aquí.
pub mod event_types {
    pub const ENERGY_ACTION_PERFORMED: &str = "EnergyActionPerformed";
    pub const ENERGY_PURCHASED: &str = "EnergyPurchased";
    pub const ENERGY_REFUNDED: &str = "EnergyRefunded";
    pub const BILLING_INTENT_CREATED: &str = "BillingIntentCreated";
    pub const NARRATIVE_STARTED: &str = "NarrativeStarted";
    pub const LOGIN_SUCCEEDED: &str = "login_succeeded";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const SESSION_CREATED: &str = "session_created";
    pub const SESSION_REFRESHED: &str = "session_refreshed";
    pub const SESSION_REVOKED: &str = "session_revoked";
    pub const SESSION_REVOKED_ALL: &str = "session_revoked_all";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const SPECIALIST_TOKEN_DELEGATED: &str = "specialist_token_delegated";
}
