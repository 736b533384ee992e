// [libs/infra/storage/src/repositories/energy.rs]
/*!
 * APARATO: ENERGY REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL BALANCE ENERGETICO CON CONCURRENCIA OPTIMISTA
 *
 * `save_if_unchanged` es la unica via de escritura del balance: compara
 * `updated_at` contra la version leida por el llamador y solo compromete
 * si nadie mas gano la carrera entretanto, tal como exige el puerto
 * `EnergyStore` del Ledger.
 */

use std::sync::Arc;

use async_trait::async_trait;
use libsql::params;
use luna_domain_energy::{EnergyError, EnergyTransaction, UserEnergy};

use crate::client::DurableStoreClient;
use crate::errors::StorageError;

pub struct EnergyRepository {
    client: Arc<DurableStoreClient>,
}

fn row_to_user_energy(row: &libsql::Row) -> Result<UserEnergy, StorageError> {
    let updated_raw: String = row.get(6).map_err(|e| StorageError::Mapping(e.to_string()))?;
    Ok(UserEnergy {
        user_id: row.get(0).map_err(|e| StorageError::Mapping(e.to_string()))?,
        current_energy: row.get(1).map_err(|e| StorageError::Mapping(e.to_string()))?,
        max_energy: row.get(2).map_err(|e| StorageError::Mapping(e.to_string()))?,
        total_consumed: row.get(3).map_err(|e| StorageError::Mapping(e.to_string()))?,
        total_purchased: row.get(4).map_err(|e| StorageError::Mapping(e.to_string()))?,
        subscription_type: row.get(5).map_err(|e| StorageError::Mapping(e.to_string()))?,
        updated_at: updated_raw.parse().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
    })
}

impl EnergyRepository {
    pub fn new(client: Arc<DurableStoreClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl luna_domain_energy::EnergyStore for EnergyRepository {
    async fn load(&self, user_id: &str) -> Result<UserEnergy, EnergyError> {
        let conn = self.client.get_connection().map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
        let mut rows = conn
            .query(
                "SELECT user_id, current_energy, max_energy, total_consumed, total_purchased, subscription_type, updated_at \
                 FROM user_energy WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;

        match rows.next().await.map_err(|e| EnergyError::StoreUnavailable(e.to_string()))? {
            Some(row) => row_to_user_energy(&row).map_err(|e| e.into()),
            None => {
                // Primer acceso: provisiona el balance de arranque y lo
                // persiste de inmediato para que concurrentes subsiguientes
                // lo encuentren ya fijado.
                let provisioned = UserEnergy::new_provisioned(user_id);
                conn.execute(
                    "INSERT INTO user_energy (user_id, current_energy, max_energy, total_consumed, total_purchased, subscription_type, updated_at) \
                     VALUES (?1, ?2, ?3, 0, 0, 'free', ?4)",
                    params![
                        provisioned.user_id.clone(),
                        provisioned.current_energy,
                        provisioned.max_energy,
                        provisioned.updated_at.to_rfc3339(),
                    ],
                )
                .await
                .map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
                Ok(provisioned)
            }
        }
    }

    async fn save_if_unchanged(&self, expected: &UserEnergy, updated: &UserEnergy) -> Result<bool, EnergyError> {
        let conn = self.client.get_connection().map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
        let affected = conn
            .execute(
                "UPDATE user_energy SET current_energy = ?1, max_energy = ?2, total_consumed = ?3, total_purchased = ?4, \
                 subscription_type = ?5, updated_at = ?6 WHERE user_id = ?7 AND updated_at = ?8",
                params![
                    updated.current_energy,
                    updated.max_energy,
                    updated.total_consumed,
                    updated.total_purchased,
                    updated.subscription_type.clone(),
                    updated.updated_at.to_rfc3339(),
                    expected.user_id.clone(),
                    expected.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
        Ok(affected > 0)
    }

    async fn record_transaction(&self, transaction: &EnergyTransaction) -> Result<(), EnergyError> {
        let conn = self.client.get_connection().map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
        conn.execute(
            "INSERT INTO energy_transactions (transaction_id, user_id, action_type, amount, reason, energy_before, energy_after, context, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                transaction.transaction_id.clone(),
                transaction.user_id.clone(),
                serde_json::to_value(transaction.action_type).ok().and_then(|v| v.as_str().map(String::from)).unwrap_or_default(),
                transaction.amount,
                transaction.reason.clone(),
                transaction.energy_before,
                transaction.energy_after,
                transaction.context.to_string(),
                transaction.created_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn count_prior_purchases(&self, user_id: &str) -> Result<u32, EnergyError> {
        let conn = self.client.get_connection().map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM energy_transactions WHERE user_id = ?1 AND action_type = 'purchase'",
                params![user_id],
            )
            .await
            .map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?;
        let count: i64 = match rows.next().await.map_err(|e| EnergyError::StoreUnavailable(e.to_string()))? {
            Some(row) => row.get(0).map_err(|e| EnergyError::StoreUnavailable(e.to_string()))?,
            None => 0,
        };
        Ok(count.max(0) as u32)
    }
}

/// Adaptador de solo lectura sobre `user_energy.subscription_type`, usado
/// por el Analizador Narrativo como primera capa (la mas confiable) de su
/// deteccion robusta de plan.
pub struct EnergyPlanProbeAdapter {
    client: Arc<DurableStoreClient>,
}

impl EnergyPlanProbeAdapter {
    pub fn new(client: Arc<DurableStoreClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl luna_domain_narrative::EnergyPlanProbe for EnergyPlanProbeAdapter {
    async fn is_unlimited_user(&self, user_id: &str) -> Result<bool, luna_domain_narrative::NarrativeError> {
        let conn = self
            .client
            .get_connection()
            .map_err(|e: StorageError| luna_domain_narrative::NarrativeError::EventSourceUnavailable(e.to_string()))?;
        let mut rows = conn
            .query("SELECT subscription_type FROM user_energy WHERE user_id = ?1", params![user_id])
            .await
            .map_err(|e| luna_domain_narrative::NarrativeError::EventSourceUnavailable(e.to_string()))?;
        match rows
            .next()
            .await
            .map_err(|e| luna_domain_narrative::NarrativeError::EventSourceUnavailable(e.to_string()))?
        {
            Some(row) => {
                let subscription_type: String = row
                    .get(0)
                    .map_err(|e| luna_domain_narrative::NarrativeError::EventSourceUnavailable(e.to_string()))?;
                Ok(subscription_type == "unlimited")
            }
            None => Ok(false),
        }
    }
}
