// [libs/domain/energy/src/ledger.rs]
/*!
 * =================================================================
 * APARATO: ENERGY LEDGER (V1.0 - HUB SOBERANO)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ARITMÉTICA ATÓMICA DEL BALANCE Y SUS TRANSACCIONES
 *
 * # Mathematical Proof (Atomic Consumption):
 * Un `consume` comprometido produce exactamente una `EnergyTransaction`
 * y exactamente un evento `EnergyActionPerformed` con el mismo
 * `transaction_id`; un `consume` fallido no produce ninguno de los dos.
 * La escritura del balance usa comparación optimista sobre `updated_at`;
 * si el evento narrativo falla tras comprometer el balance, la mutación
 * se revierte explícitamente para preservar la atomicidad observable.
 * =================================================================
 */

use crate::catalog::{lookup_action, lookup_pack};
use crate::errors::EnergyError;
use crate::ports::{EnergyCache, EnergyStore, EventSink};
use crate::types::{ActionType, EnergyTransaction, UserEnergy, UNLIMITED_SENTINEL};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

const MAX_CONCURRENCY_RETRIES: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSnapshot {
    pub current: f64,
    pub max: f64,
    pub percentage: f64,
    pub can_perform_basic: bool,
    pub unlimited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrecheckResult {
    pub can_perform: bool,
    pub required: f64,
    pub current: f64,
    pub deficit: f64,
    pub unlimited: bool,
    pub plan: String,
    /// Paquete mas barato que cubriria el deficit; `None` cuando no hace
    /// falta (saldo suficiente o usuario ilimitado).
    pub suggested_pack: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct ConsumeResult {
    pub transaction_id: String,
    pub consumed: f64,
    pub remaining: f64,
    pub event_id: Uuid,
    pub unlimited: bool,
}

#[derive(Debug, Clone)]
pub struct RefundResult {
    pub transaction_id: String,
    pub refunded: f64,
    pub new_balance: f64,
}

#[derive(Debug, Clone)]
pub struct PurchaseResult {
    pub purchase_id: String,
    pub energy_added: f64,
    pub bonus_applied: bool,
    pub current_energy: f64,
}

/// Ledger de energía compuesto por puertos inyectados. No conoce el
/// transporte de persistencia concreto: sólo aritmética y orquestación
/// de los contratos `EnergyStore`/`EventSink`/`EnergyCache`.
pub struct EnergyLedger<S: EnergyStore, E: EventSink, C: EnergyCache> {
    store: Arc<S>,
    events: Arc<E>,
    cache: Option<Arc<C>>,
}

impl<S: EnergyStore, E: EventSink, C: EnergyCache> EnergyLedger<S, E, C> {
    pub fn new(store: Arc<S>, events: Arc<E>, cache: Option<Arc<C>>) -> Self {
        Self { store, events, cache }
    }

    #[instrument(skip(self))]
    pub async fn check_balance(&self, user_id: &str) -> Result<BalanceSnapshot, EnergyError> {
        let energy = self.store.load(user_id).await?;
        let unlimited = energy.is_unlimited();
        Ok(BalanceSnapshot {
            current: if unlimited { UNLIMITED_SENTINEL } else { energy.current_energy },
            max: energy.max_energy,
            percentage: if unlimited { 100.0 } else { energy.percentage() },
            can_perform_basic: unlimited || energy.current_energy > 0.0,
            unlimited,
        })
    }

    #[instrument(skip(self))]
    pub async fn can_perform(&self, user_id: &str, action_name: &str) -> Result<PrecheckResult, EnergyError> {
        let action = lookup_action(action_name)
            .ok_or_else(|| EnergyError::UnknownAction(action_name.to_string()))?;
        let energy = self.store.load(user_id).await?;

        if energy.is_unlimited() {
            return Ok(PrecheckResult {
                can_perform: true,
                required: 0.0,
                current: UNLIMITED_SENTINEL,
                deficit: 0.0,
                unlimited: true,
                plan: energy.subscription_type.clone(),
                suggested_pack: None,
            });
        }

        let deficit = (action.cost - energy.current_energy).max(0.0);
        let can_perform = energy.current_energy >= action.cost;
        Ok(PrecheckResult {
            can_perform,
            required: action.cost,
            current: energy.current_energy,
            deficit,
            unlimited: false,
            plan: energy.subscription_type,
            suggested_pack: if can_perform { None } else { Some(crate::catalog::suggest_pack_for_deficit(deficit)) },
        })
    }

    /// Ejecuta un consumo atómico. Ver prueba matemática en el encabezado
    /// del módulo para el contrato de atomicidad exacto.
    #[instrument(skip(self, context))]
    pub async fn consume(
        &self,
        user_id: &str,
        action_name: &str,
        app_source: &str,
        context: Value,
    ) -> Result<ConsumeResult, EnergyError> {
        let action = lookup_action(action_name)
            .ok_or_else(|| EnergyError::UnknownAction(action_name.to_string()))?;

        let mut current = self.store.load(user_id).await?;

        if current.is_unlimited() {
            let transaction_id = Uuid::new_v4().to_string();
            let event_id = self
                .events
                .append(
                    user_id,
                    "EnergyActionPerformed",
                    app_source,
                    json!({
                        "action": action_name,
                        "energy_cost": 0,
                        "original_cost": action.cost,
                        "unlimited": true,
                        "transaction_id": transaction_id,
                        "context": context,
                    }),
                    json!({ "event_category": "energy_management" }),
                )
                .await?;
            return Ok(ConsumeResult {
                transaction_id,
                consumed: 0.0,
                remaining: UNLIMITED_SENTINEL,
                event_id,
                unlimited: true,
            });
        }

        for attempt in 0..MAX_CONCURRENCY_RETRIES {
            if current.current_energy < action.cost {
                let deficit = (action.cost - current.current_energy).max(0.0);
                return Err(EnergyError::InsufficientEnergy {
                    required: action.cost,
                    current: current.current_energy,
                    deficit,
                    suggested_pack: crate::catalog::suggest_pack_for_deficit(deficit),
                });
            }

            let mut updated = current.clone();
            updated.current_energy -= action.cost;
            updated.total_consumed += action.cost;
            updated.updated_at = Utc::now();

            let committed = self.store.save_if_unchanged(&current, &updated).await?;
            if !committed {
                warn!(user_id, attempt, "⚠️ [ENERGY_CAS_RETRY]: Conflicto de concurrencia, reintentando.");
                current = self.store.load(user_id).await?;
                continue;
            }

            let transaction_id = Uuid::new_v4().to_string();
            let transaction = EnergyTransaction {
                transaction_id: transaction_id.clone(),
                user_id: user_id.to_string(),
                action_type: ActionType::Consume,
                amount: action.cost,
                reason: action_name.to_string(),
                energy_before: current.current_energy,
                energy_after: updated.current_energy,
                context: context.clone(),
                created_at: Utc::now(),
            };

            if let Err(store_error) = self.store.record_transaction(&transaction).await {
                self.store.save_if_unchanged(&updated, &current).await.ok();
                return Err(store_error);
            }

            let event_result = self
                .events
                .append(
                    user_id,
                    "EnergyActionPerformed",
                    app_source,
                    json!({
                        "action": action_name,
                        "energy_cost": action.cost,
                        "unlimited": false,
                        "transaction_id": transaction_id,
                        "remaining": updated.current_energy,
                        "context": context,
                    }),
                    json!({ "event_category": "energy_management" }),
                )
                .await;

            let event_id = match event_result {
                Ok(id) => id,
                Err(event_error) => {
                    self.store.save_if_unchanged(&updated, &current).await.ok();
                    return Err(event_error);
                }
            };

            if let Some(cache) = &self.cache {
                cache.invalidate_user_energy(user_id).await;
            }

            return Ok(ConsumeResult {
                transaction_id,
                consumed: action.cost,
                remaining: updated.current_energy,
                event_id,
                unlimited: false,
            });
        }

        Err(EnergyError::ConcurrencyExhausted { attempts: MAX_CONCURRENCY_RETRIES })
    }

    #[instrument(skip(self, context))]
    pub async fn refund(
        &self,
        user_id: &str,
        amount: f64,
        reason: &str,
        original_event_id: Uuid,
        context: Value,
    ) -> Result<RefundResult, EnergyError> {
        let mut current = self.store.load(user_id).await?;

        for attempt in 0..MAX_CONCURRENCY_RETRIES {
            let mut updated = current.clone();
            updated.current_energy = (current.current_energy + amount).min(current.max_energy);
            updated.updated_at = Utc::now();

            let committed = self.store.save_if_unchanged(&current, &updated).await?;
            if !committed {
                warn!(user_id, attempt, "⚠️ [ENERGY_CAS_RETRY]: Conflicto en reembolso, reintentando.");
                current = self.store.load(user_id).await?;
                continue;
            }

            let transaction_id = Uuid::new_v4().to_string();
            let transaction = EnergyTransaction {
                transaction_id: transaction_id.clone(),
                user_id: user_id.to_string(),
                action_type: ActionType::Refund,
                amount,
                reason: reason.to_string(),
                energy_before: current.current_energy,
                energy_after: updated.current_energy,
                context: context.clone(),
                created_at: Utc::now(),
            };
            self.store.record_transaction(&transaction).await?;

            self.events
                .append(
                    user_id,
                    "EnergyRefunded",
                    "luna-hub",
                    json!({
                        "amount": amount,
                        "reason": reason,
                        "original_action_event_id": original_event_id,
                        "transaction_id": transaction_id,
                        "new_balance": updated.current_energy,
                    }),
                    json!({ "event_category": "energy_management" }),
                )
                .await?;

            if let Some(cache) = &self.cache {
                cache.invalidate_user_energy(user_id).await;
            }

            return Ok(RefundResult {
                transaction_id,
                refunded: amount,
                new_balance: updated.current_energy,
            });
        }

        Err(EnergyError::ConcurrencyExhausted { attempts: MAX_CONCURRENCY_RETRIES })
    }

    #[instrument(skip(self))]
    pub async fn purchase(
        &self,
        user_id: &str,
        pack_code: &str,
        payment_intent_id: &str,
    ) -> Result<PurchaseResult, EnergyError> {
        let pack = lookup_pack(pack_code)
            .ok_or_else(|| EnergyError::UnknownPack(pack_code.to_string()))?;

        let current = self.store.load(user_id).await?;
        if current.is_unlimited() {
            return Err(EnergyError::PurchaseForbidden);
        }

        let mut updated = current.clone();
        let mut bonus_applied = false;
        let energy_added;

        if pack.is_unlimited_subscription {
            updated.subscription_type = "unlimited".to_string();
            updated.max_energy = UNLIMITED_SENTINEL;
            updated.current_energy = 100.0;
            energy_added = UNLIMITED_SENTINEL;
        } else {
            let prior_purchases = self.store.count_prior_purchases(user_id).await?;
            let mut units = pack.energy_units;
            if prior_purchases == 0 && pack.first_purchase_bonus_pct > 0.0 {
                units += pack.energy_units * pack.first_purchase_bonus_pct;
                bonus_applied = true;
            }
            updated.current_energy += units;
            updated.total_purchased += units;
            updated.max_energy = updated.max_energy.max(updated.current_energy);
            energy_added = units;
        }
        updated.updated_at = Utc::now();

        let committed = self.store.save_if_unchanged(&current, &updated).await?;
        if !committed {
            return Err(EnergyError::ConcurrencyExhausted { attempts: 1 });
        }

        let purchase_id = Uuid::new_v4().to_string();
        let transaction = EnergyTransaction {
            transaction_id: purchase_id.clone(),
            user_id: user_id.to_string(),
            action_type: ActionType::Purchase,
            amount: energy_added,
            reason: pack_code.to_string(),
            energy_before: current.current_energy,
            energy_after: updated.current_energy,
            context: json!({ "payment_intent_id": payment_intent_id }),
            created_at: Utc::now(),
        };
        self.store.record_transaction(&transaction).await?;

        self.events
            .append(
                user_id,
                "EnergyPurchased",
                "luna-hub",
                json!({
                    "pack_code": pack_code,
                    "intent_id": payment_intent_id,
                    "energy_added": energy_added,
                    "bonus_applied": bonus_applied,
                    "purchase_id": purchase_id,
                }),
                json!({ "event_category": "energy_management" }),
            )
            .await?;

        if let Some(cache) = &self.cache {
            cache.invalidate_user_energy(user_id).await;
        }

        Ok(PurchaseResult {
            purchase_id,
            energy_added,
            bonus_applied,
            current_energy: updated.current_energy,
        })
    }
}
