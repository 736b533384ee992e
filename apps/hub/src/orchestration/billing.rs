// [apps/hub/src/orchestration/billing.rs]
/*!
 * APARATO: TUBERIA DE FACTURACION DE ENERGIA (ESTRATO L4)
 * RESPONSABILIDAD: CREACION DE INTENCIONES DE PAGO Y CONFIRMACION IDEMPOTENTE
 */

use luna_domain_energy::{lookup_pack, PurchaseResult};
use serde_json::json;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;

pub struct BillingIntent {
    pub intent_id: String,
    pub pack_code: String,
    pub price_cents: u32,
    pub currency: &'static str,
}

/// Crea una intencion de pago para un paquete de energia. El identificador
/// de intencion es la clave de idempotencia que `confirm_purchase` exige
/// antes de acreditar energia alguna.
pub async fn create_intent(state: &AppState, user_id: &str, pack_code: &str) -> Result<BillingIntent, ApiError> {
    let pack = lookup_pack(pack_code).ok_or_else(|| ApiError::bad_request("UNKNOWN_PACK", format!("Paquete desconocido: {pack_code}")))?;

    let intent_id = Uuid::new_v4().to_string();
    state
        .events
        .append_event(
            user_id,
            luna_domain_models::event_types::BILLING_INTENT_CREATED,
            "luna-hub",
            json!({ "pack_code": pack_code, "intent_id": intent_id, "price_cents": pack.price_cents }),
            json!({ "event_category": "billing" }),
        )
        .await?;

    Ok(BillingIntent { intent_id, pack_code: pack_code.to_string(), price_cents: pack.price_cents, currency: pack.currency })
}

/// Confirma el pago de una intencion previamente creada. Es idempotente en
/// `intent_id`: una segunda confirmacion con el mismo identificador no
/// acredita energia dos veces.
pub async fn confirm_purchase(state: &AppState, user_id: &str, pack_code: &str, intent_id: &str) -> Result<PurchaseResult, ApiError> {
    if let Some(existing_event) = state.events.find_purchase_referencing_intent(intent_id).await? {
        let energy_added = existing_event.event_data.get("energy_added").and_then(serde_json::Value::as_f64).unwrap_or(0.0);
        let bonus_applied = existing_event.event_data.get("bonus_applied").and_then(serde_json::Value::as_bool).unwrap_or(false);
        let purchase_id = existing_event.event_data.get("purchase_id").and_then(serde_json::Value::as_str).unwrap_or_default().to_string();
        let snapshot = state.ledger.check_balance(user_id).await?;
        return Ok(PurchaseResult { purchase_id, energy_added, bonus_applied, current_energy: snapshot.current });
    }

    let result = state.ledger.purchase(user_id, pack_code, intent_id).await?;
    state.narrative.invalidate(user_id).await;
    Ok(result)
}
