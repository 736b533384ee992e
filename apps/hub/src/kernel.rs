// [apps/hub/src/kernel.rs]
/*!
 * APARATO: NUCLEO DE COMPOSICION DEL HUB (ESTRATO L4)
 * RESPONSABILIDAD: ENSAMBLAJE DE PUERTOS DE DOMINIO E IGNICION DEL SERVIDOR HTTP
 *
 * `HubKernel::ignite` es el unico lugar del crate donde las piezas de
 * infraestructura (conexion durable, adaptador de cache) se convierten en
 * los cuatro servicios de negocio que `AppState` expone a los handlers.
 * `launch` levanta, ademas del servidor axum, el unico daemon de fondo
 * que el Hub necesita: el barrido periodico de bloqueos de limitacion
 * de tasa ya vencidos.
 */

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use luna_domain_energy::EnergyLedger;
use luna_domain_narrative::NarrativeAnalyzer;
use luna_domain_ratelimit::RateLimiter;
use luna_domain_tokens::TokenService;
use luna_infra_cache::{CacheConfig, RedisCacheAdapter};
use luna_infra_storage::repositories::energy::EnergyPlanProbeAdapter;
use luna_infra_storage::{BlockRepository, DurableStoreClient, EnergyRepository, EventRepository, SessionRepository, UserRepository};
use tracing::{error, info, instrument, warn};

use crate::config::HubConfig;
use crate::routes::build_router;
use crate::state::AppState;

/// Intervalo de barrido del reaper de bloqueos de limitacion de tasa.
const BLOCK_REAPER_INTERVAL_SECONDS: u64 = 300;

pub struct HubKernel {
    port: u16,
    state: AppState,
}

impl HubKernel {
    /// Conecta el enlace durable y el adaptador de cache, construye los
    /// cinco repositorios de infraestructura y los cuatro servicios de
    /// dominio que satisfacen, y devuelve el estado compartido listo
    /// para ser inyectado en el router.
    #[instrument(skip(config))]
    pub async fn ignite(config: HubConfig) -> Result<Self, String> {
        let store = Arc::new(
            DurableStoreClient::connect(&config.database_url, config.turso_auth_token.clone())
                .await
                .map_err(|e| format!("fallo de enlace con el motor durable: {e}"))?,
        );

        let cache = Arc::new(
            RedisCacheAdapter::connect(&config.redis_url, CacheConfig::default())
                .map_err(|e| format!("fallo de enlace con el backend de cache: {e}"))?,
        );

        let users = Arc::new(UserRepository::new(store.clone()));
        let events = Arc::new(EventRepository::new(store.clone()));
        let energy_store = Arc::new(EnergyRepository::new(store.clone()));
        let plan_probe = Arc::new(EnergyPlanProbeAdapter::new(store.clone()));
        let blocks = Arc::new(BlockRepository::new(store.clone()));
        let sessions = Arc::new(SessionRepository::new(store.clone()));

        let ledger = Arc::new(EnergyLedger::new(energy_store, events.clone(), Some(cache.clone())));
        let limiter = Arc::new(RateLimiter::new(cache.clone(), blocks, events.clone(), events.clone()));
        let tokens = Arc::new(TokenService::new(config.jwt_secret_key.clone().into_bytes(), sessions, events.clone()));
        let narrative = Arc::new(NarrativeAnalyzer::new(events.clone(), plan_probe, Some(cache.clone())));

        let state = AppState::new(store, cache, users, events, ledger, limiter, tokens, narrative, config.jwt_secret_key.clone().into(), config.cookie_secure);

        info!("🌙 [HUB_STATE]: estado compartido ensamblado, modo operacional.");

        Ok(Self { port: config.port, state })
    }

    /// Levanta el reaper de bloqueos vencidos y el servidor HTTP; no
    /// retorna mientras el proceso permanezca vivo.
    pub async fn launch(self) {
        spawn_block_reaper(self.state.clone());

        let router = build_router(self.state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.port);

        let listener = match tokio::net::TcpListener::bind(bind_address).await {
            Ok(listener) => listener,
            Err(fault) => {
                error!("💀 [KERNEL_COLLAPSE]: fallo al enlazar el puerto {}: {}", self.port, fault);
                std::process::exit(1);
            }
        };

        info!("🚀 [KERNEL_ONLINE]: Luna Hub escuchando en {}", bind_address);

        if let Err(fault) = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await {
            error!("💀 [KERNEL_COLLAPSE]: fallo en tiempo de ejecucion del servidor: {}", fault);
            std::process::exit(1);
        }
    }
}

/// Barre periodicamente la tabla de bloqueos de limitacion de tasa,
/// eliminando registros ya vencidos para que no crezca sin limite.
fn spawn_block_reaper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(BLOCK_REAPER_INTERVAL_SECONDS));
        loop {
            ticker.tick().await;
            match state.limiter.cleanup_expired_blocks().await {
                Ok(purged) if purged > 0 => info!("🧹 [BLOCK_REAPER]: {} bloqueos vencidos purgados.", purged),
                Ok(_) => {}
                Err(fault) => warn!("⚠️ [BLOCK_REAPER_FAULT]: fallo al purgar bloqueos vencidos: {}", fault),
            }
        }
    });
}
