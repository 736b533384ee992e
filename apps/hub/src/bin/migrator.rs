// [apps/hub/src/bin/migrator.rs]
/*!
 * APARATO: CLI DE NIVELACION DE ESQUEMA (ESTRATO L6)
 * RESPONSABILIDAD: APLICACION EXPLICITA DEL ESQUEMA DURABLE FUERA DEL ARRANQUE DEL HUB
 *
 * `DurableStoreClient::connect` ya aplica el esquema sobre la conexion
 * ancla en cada arranque del servidor; este binario existe para que un
 * pipeline de despliegue pueda nivelar el esquema de forma aislada,
 * antes de promover una nueva version del Hub, sin levantar el servidor.
 */

use dotenvy::dotenv;
use luna_infra_storage::DurableStoreClient;
use luna_shared_telemetry::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing("luna_migrator");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        info!("🚀 [MIGRATOR]: nivelando esquema del motor durable...");

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL no definido en el entorno de ejecucion"))?;
        let auth_token = std::env::var("TURSO_AUTH_TOKEN").ok();

        match DurableStoreClient::connect(&database_url, auth_token).await {
            Ok(_) => {
                info!("✨ [MIGRATOR_SUCCESS]: esquema nivelado, conexion ancla verificada.");
                Ok(())
            }
            Err(fault) => {
                error!("💀 [SCHEMA_COLLAPSE]: fallo al nivelar el esquema: {}", fault);
                std::process::exit(1);
            }
        }
    })
}
