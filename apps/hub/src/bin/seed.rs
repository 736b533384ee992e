// [apps/hub/src/bin/seed.rs]
/*!
 * APARATO: SEMBRADOR DE DATOS DE DESARROLLO (ESTRATO L6)
 * RESPONSABILIDAD: PROVISIONAR UN USUARIO DEMO PARA PRUEBAS LOCALES MANUALES
 *
 * El balance energetico se provisiona por si solo en el primer acceso
 * via `EnergyStore::load`, asi que este binario solo necesita fijar la
 * identidad; no escribe directamente en `user_energy`.
 */

use dotenvy::dotenv;
use luna_infra_storage::{DurableStoreClient, UserRepository};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

const SEED_EMAIL: &str = "demo@luna.local";
const SEED_PASSWORD: &str = "luna-demo-1234";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    luna_shared_telemetry::init_tracing("luna_seed");

    info!("💠 [SEED]: provisionando usuario demo...");

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL no definido en el entorno de ejecucion"))?;
    let auth_token = std::env::var("TURSO_AUTH_TOKEN").ok();

    let store = Arc::new(DurableStoreClient::connect(&database_url, auth_token).await?);
    let users = UserRepository::new(store);

    if users.find_by_email(SEED_EMAIL).await?.is_some() {
        info!("✅ [SEED]: el usuario demo ya existe, nada que hacer.");
        return Ok(());
    }

    let password_hash =
        bcrypt::hash(SEED_PASSWORD, bcrypt::DEFAULT_COST).map_err(|e| anyhow::anyhow!("fallo al cifrar la contrasena demo: {e}"))?;
    let user_id = Uuid::new_v4().to_string();

    match users.create_user(&user_id, SEED_EMAIL, &password_hash).await {
        Ok(user) => {
            info!("✅ [SEED_COMPLETE]: usuario demo {} ({}) listo.", user.email, user.user_id);
            Ok(())
        }
        Err(fault) => {
            error!("💀 [SEED_FAULT]: fallo al crear el usuario demo: {}", fault);
            std::process::exit(1);
        }
    }
}
