// [libs/infra/storage/src/repositories/users.rs]
/*!
 * APARATO: USER REPOSITORY (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE LA IDENTIDAD Y DEL PLAN AUTORITATIVO
 */

use std::sync::Arc;

use chrono::Utc;
use libsql::params;
use luna_domain_models::{Plan, User};

use crate::client::DurableStoreClient;
use crate::errors::StorageError;

pub struct UserRepository {
    client: Arc<DurableStoreClient>,
}

fn row_to_user(row: &libsql::Row) -> Result<User, StorageError> {
    let plan_text: String = row.get(3).map_err(|e| StorageError::Mapping(e.to_string()))?;
    let plan = match plan_text.as_str() {
        "premium" => Plan::Premium,
        "unlimited" => Plan::Unlimited,
        _ => Plan::Free,
    };
    let created_raw: String = row.get(5).map_err(|e| StorageError::Mapping(e.to_string()))?;
    Ok(User {
        user_id: row.get(0).map_err(|e| StorageError::Mapping(e.to_string()))?,
        email: row.get(1).map_err(|e| StorageError::Mapping(e.to_string()))?,
        password_hash: row.get(2).map_err(|e| StorageError::Mapping(e.to_string()))?,
        plan,
        active: row.get::<i64>(4).map_err(|e| StorageError::Mapping(e.to_string()))? != 0,
        created_at: created_raw.parse().map_err(|e: chrono::ParseError| StorageError::Mapping(e.to_string()))?,
    })
}

impl UserRepository {
    pub fn new(client: Arc<DurableStoreClient>) -> Self {
        Self { client }
    }

    pub async fn create_user(&self, user_id: &str, email: &str, password_hash: &str) -> Result<User, StorageError> {
        let conn = self.client.get_connection()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO users (user_id, email, password_hash, plan, active, created_at) VALUES (?1, ?2, ?3, 'free', 1, ?4)",
            params![user_id, email, password_hash, created_at.to_rfc3339()],
        )
        .await?;
        Ok(User {
            user_id: user_id.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            plan: Plan::Free,
            active: true,
            created_at,
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query("SELECT user_id, email, password_hash, plan, active, created_at FROM users WHERE email = ?1", params![email])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query("SELECT user_id, email, password_hash, plan, active, created_at FROM users WHERE user_id = ?1", params![user_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn set_plan(&self, user_id: &str, plan: Plan) -> Result<(), StorageError> {
        let conn = self.client.get_connection()?;
        conn.execute("UPDATE users SET plan = ?1 WHERE user_id = ?2", params![plan.as_str(), user_id]).await?;
        Ok(())
    }
}
