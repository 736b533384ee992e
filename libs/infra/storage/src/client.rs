// [libs/infra/storage/src/client.rs]
/*!
 * APARATO: DATABASE CONNECTION CLIENT (ESTRATO L3)
 * RESPONSABILIDAD: GESTION DE ENLACES Y PERSISTENCIA ACID
 *
 * En modo memoria (`:memory:` o `mode=memory`), el esquema se compromete
 * sobre una conexion ancla que permanece viva durante todo el proceso:
 * sin ella, SQLite purgaria las tablas en cuanto la ultima conexion
 * efimera se cerrara, y el Hub perderia su propio esquema a mitad de vuelo.
 */

use crate::errors::StorageError;
use crate::schema::apply_full_sovereign_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct DurableStoreClient {
    driver: Arc<Database>,
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl DurableStoreClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(database_url: &str, auth_token: Option<String>) -> Result<Self, StorageError> {
        if database_url.is_empty() {
            return Err(StorageError::Configuration("DATABASE_URL no definido".into()));
        }

        info!("🔌 [STORAGE]: Conectando al motor durable en [{}]", database_url);

        let is_remote = database_url.starts_with("libsql://") || database_url.starts_with("https://");
        let is_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let driver = if is_remote {
            let token = auth_token.ok_or_else(|| StorageError::Configuration("TURSO_AUTH_TOKEN ausente para enlace remoto".into()))?;
            Builder::new_remote(database_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_url).build().await
        }
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let shared_driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = shared_driver.connect().map_err(|e| StorageError::Connection(e.to_string()))?;
            apply_full_sovereign_schema(&anchor_conn).await.map_err(|e| StorageError::Connection(e.to_string()))?;
            anchor = Some(Arc::new(anchor_conn));
            info!("⚓ [STORAGE]: Esquema en memoria anclado para la vida del proceso.");
        } else {
            let bootstrap_conn = shared_driver.connect().map_err(|e| StorageError::Connection(e.to_string()))?;
            apply_full_sovereign_schema(&bootstrap_conn).await.map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        Ok(Self { driver: shared_driver, _memory_persistence_anchor: anchor })
    }

    pub fn get_connection(&self) -> Result<Connection, StorageError> {
        self.driver.connect().map_err(|e| {
            error!("⚠️ [STORAGE_POOL_FAULT]: fallo al asignar conexion: {}", e);
            StorageError::Connection(e.to_string())
        })
    }
}
