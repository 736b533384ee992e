// [libs/domain/energy/src/types.rs]
/*!
 * APARATO: ENERGY VALUE TYPES (ESTRATO L2)
 * RESPONSABILIDAD: REPRESENTACIÓN NOMINAL DE LA ENERGÍA Y SUS TRANSACCIONES
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinela numérico usado históricamente en el sistema origen para
/// representar "energía ilimitada" de forma JSON-segura. Se preserva
/// como valor de serialización junto al flag explícito `unlimited`.
pub const UNLIMITED_SENTINEL: f64 = 999.0;

/// Balance inicial otorgado a un usuario en su primer acceso.
pub const STARTING_ENERGY: f64 = 100.0;

/// Representación discriminada de un balance de energía, evitando la
/// ambigüedad `float('inf')` vs sentinela 999 del sistema origen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Energy {
    Finite(f64),
    Unlimited,
}

impl Energy {
    pub fn as_reported(&self) -> f64 {
        match self {
            Energy::Finite(value) => *value,
            Energy::Unlimited => UNLIMITED_SENTINEL,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Energy::Unlimited)
    }
}

/// Snapshot persistido del balance energético de un usuario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnergy {
    pub user_id: String,
    pub current_energy: f64,
    pub max_energy: f64,
    pub total_consumed: f64,
    pub total_purchased: f64,
    pub subscription_type: String,
    pub updated_at: DateTime<Utc>,
}

impl UserEnergy {
    /// Construye el estado inicial de un usuario que nunca ha sido
    /// provisionado: balance de arranque, sin consumo ni compras.
    pub fn new_provisioned(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_energy: STARTING_ENERGY,
            max_energy: STARTING_ENERGY,
            total_consumed: 0.0,
            total_purchased: 0.0,
            subscription_type: "free".to_string(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.subscription_type == "unlimited"
    }

    pub fn percentage(&self) -> f64 {
        if self.max_energy <= 0.0 {
            0.0
        } else {
            (self.current_energy / self.max_energy * 100.0).clamp(0.0, 100.0)
        }
    }
}

/// Tipo de movimiento registrado en el libro mayor de transacciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Consume,
    Refund,
    Purchase,
}

/// Fila inmutable del libro mayor de energía. `energy_after - energy_before`
/// debe respetar el signo dictado por `action_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyTransaction {
    pub transaction_id: String,
    pub user_id: String,
    pub action_type: ActionType,
    pub amount: f64,
    pub reason: String,
    pub energy_before: f64,
    pub energy_after: f64,
    pub context: Value,
    pub created_at: DateTime<Utc>,
}
