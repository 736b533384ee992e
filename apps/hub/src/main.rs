// [apps/hub/src/main.rs]
/*!
 * APARATO: PUNTO DE ENTRADA DEL BINARIO HUB (ESTRATO L4)
 * RESPONSABILIDAD: CARGA DE ENTORNO, TELEMETRIA E IGNICION DEL KERNEL
 */

use dotenvy::dotenv;
use luna_hub::prelude::*;
use luna_shared_telemetry::init_tracing;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("luna_hub");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        info!("🌙 [LUNA_HUB]: Secuencia de ignicion iniciada.");

        let config = match HubConfig::from_env() {
            Ok(config) => config,
            Err(fault) => {
                error!("💀 [BOOT_FAULT]: {}", fault);
                std::process::exit(1);
            }
        };

        let port = config.port;
        let kernel = match HubKernel::ignite(config).await {
            Ok(kernel) => kernel,
            Err(fault) => {
                error!("💀 [BOOT_FAULT]: fallo al ensamblar el estado del Hub: {}", fault);
                std::process::exit(1);
            }
        };

        info!("🚀 [LUNA_HUB_ONLINE]: escuchando en el puerto {}.", port);
        kernel.launch().await;

        Ok(())
    })
}
