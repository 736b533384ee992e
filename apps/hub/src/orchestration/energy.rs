// [apps/hub/src/orchestration/energy.rs]
/*!
 * APARATO: TUBERIA DE ACCION MEDIDA Y REEMBOLSO (ESTRATO L4)
 * RESPONSABILIDAD: CONSUMO CON LIMITACION DE TASA Y REEMBOLSO IDEMPOTENTE
 */

use chrono::Utc;
use luna_domain_energy::{lookup_action, ConsumeResult, RefundResult};
use luna_domain_ratelimit::RateLimitScope;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;

const REFUND_WINDOW_DAYS: i64 = 7;

/// Ejecuta el flujo completo de una accion medida: limitacion de tasa por
/// usuario, pre-chequeo de saldo, y consumo atomico. La ejecucion real de
/// la accion de negocio (generar un CV, una carta, etc.) ocurre en el
/// microservicio llamante antes de invocar este flujo; el Hub solo
/// certifica que habia saldo y registra el consumo.
pub async fn consume_metered_action(
    state: &AppState,
    user_id: &str,
    action_name: &str,
    app_source: &str,
    context: Value,
) -> Result<ConsumeResult, ApiError> {
    state.limiter.check_rate_limit(RateLimitScope::ApiEnergy, user_id).await?;

    let precheck = state.ledger.can_perform(user_id, action_name).await?;
    if !precheck.can_perform {
        return Err(ApiError::from(luna_domain_energy::EnergyError::InsufficientEnergy {
            required: precheck.required,
            current: precheck.current,
            deficit: precheck.deficit,
            suggested_pack: precheck.suggested_pack.unwrap_or_else(|| luna_domain_energy::suggest_pack_for_deficit(precheck.deficit)),
        }));
    }

    let result = state.ledger.consume(user_id, action_name, app_source, context).await?;
    state.narrative.invalidate(user_id).await;
    Ok(result)
}

/// Reembolsa una accion previamente consumida, exigiendo: propiedad del
/// evento por el usuario solicitante, antiguedad dentro de la ventana de
/// gracia, elegibilidad de la accion original, y ausencia de un reembolso
/// previo sobre el mismo evento (idempotencia cruzada de eventos).
pub async fn refund_action(
    state: &AppState,
    user_id: &str,
    original_event_id: Uuid,
    reason: &str,
    context: Value,
) -> Result<RefundResult, ApiError> {
    let original_event = state
        .events
        .find_event(original_event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("El evento de consumo original no existe"))?;

    if original_event.user_id != user_id {
        return Err(ApiError::forbidden("El evento de consumo pertenece a otro usuario"));
    }

    if original_event.event_type != luna_domain_models::event_types::ENERGY_ACTION_PERFORMED {
        return Err(ApiError::bad_request("NOT_REFUNDABLE_EVENT", "El evento referenciado no es un consumo de energia"));
    }

    let age = Utc::now().signed_duration_since(original_event.created_at);
    if age.num_days() > REFUND_WINDOW_DAYS {
        return Err(ApiError::bad_request("REFUND_WINDOW_EXPIRED", "La ventana de reembolso de 7 dias ha expirado"));
    }

    let action_name = original_event
        .event_data
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::internal("El evento de consumo no registra la accion ejecutada"))?;

    let action = lookup_action(action_name).ok_or_else(|| ApiError::internal("Accion de catalogo desconocida en evento historico"))?;
    if !action.refund_eligible {
        return Err(ApiError::forbidden("Esta accion no es elegible para reembolso"));
    }

    if state.events.find_refund_referencing(original_event_id).await?.is_some() {
        return Err(ApiError::conflict("Este evento ya fue reembolsado anteriormente"));
    }

    let amount = original_event.event_data.get("energy_cost").and_then(Value::as_f64).unwrap_or(action.cost);

    let result = state.ledger.refund(user_id, amount, reason, original_event_id, context).await?;
    state.narrative.invalidate(user_id).await;
    Ok(result)
}

/// Determina si un evento de consumo sigue siendo elegible para reembolso,
/// sin ejecutar el reembolso. Utilizado por el endpoint de consulta previa.
pub async fn check_refund_eligibility(state: &AppState, user_id: &str, event_id: Uuid) -> Result<bool, ApiError> {
    let event = match state.events.find_event(event_id).await? {
        Some(event) => event,
        None => return Ok(false),
    };

    if event.user_id != user_id || event.event_type != luna_domain_models::event_types::ENERGY_ACTION_PERFORMED {
        return Ok(false);
    }

    let age = Utc::now().signed_duration_since(event.created_at);
    if age.num_days() > REFUND_WINDOW_DAYS {
        return Ok(false);
    }

    let action_name = match event.event_data.get("action").and_then(Value::as_str) {
        Some(name) => name,
        None => return Ok(false),
    };
    let eligible_action = lookup_action(action_name).map(|action| action.refund_eligible).unwrap_or(false);
    if !eligible_action {
        return Ok(false);
    }

    Ok(state.events.find_refund_referencing(event_id).await?.is_none())
}
