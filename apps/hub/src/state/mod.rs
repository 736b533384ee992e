// [apps/hub/src/state/mod.rs]
/*!
 * APARATO: ESTADO COMPARTIDO DEL HUB (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTACION DE PUERTOS Y SERVICIOS EN UN UNICO HANDLE CLONABLE
 *
 * `AppState` es el unico valor que cruza la frontera HTTP hacia los
 * handlers de axum: cada campo es un `Arc`, de modo que clonar el estado
 * por request es una operacion de costo constante.
 */

use std::sync::{Arc, RwLock};

use luna_domain_energy::EnergyLedger;
use luna_domain_narrative::NarrativeAnalyzer;
use luna_domain_ratelimit::RateLimiter;
use luna_domain_tokens::TokenService;
use luna_infra_cache::RedisCacheAdapter;
use luna_infra_storage::repositories::energy::EnergyPlanProbeAdapter;
use luna_infra_storage::{BlockRepository, DurableStoreClient, EnergyRepository, EventRepository, SessionRepository, UserRepository};
use tracing::{info, warn};

pub type Ledger = EnergyLedger<EnergyRepository, EventRepository, RedisCacheAdapter>;
pub type Limiter = RateLimiter<RedisCacheAdapter, BlockRepository, EventRepository, EventRepository>;
pub type Tokens = TokenService<SessionRepository, EventRepository>;
pub type Narrative = NarrativeAnalyzer<EventRepository, EnergyPlanProbeAdapter, RedisCacheAdapter>;

/// Modos de salud del Hub para la interceptacion de middleware perimetral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    Operational,
    Maintenance(String),
}

/// Estado soberano del Hub: el enlace durable, el adaptador de cache, los
/// repositorios que satisfacen los puertos hexagonales de dominio, y los
/// cuatro servicios de negocio ya ensamblados sobre ellos.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DurableStoreClient>,
    pub cache: Arc<RedisCacheAdapter>,

    pub users: Arc<UserRepository>,
    pub events: Arc<EventRepository>,

    pub ledger: Arc<Ledger>,
    pub limiter: Arc<Limiter>,
    pub tokens: Arc<Tokens>,
    pub narrative: Arc<Narrative>,

    pub jwt_secret: Arc<str>,
    /// Si `false`, la cookie `phoenix_session` se emite sin el atributo
    /// `Secure` (solo para desarrollo local sobre HTTP plano).
    pub cookie_secure: bool,
    pub current_system_mode: Arc<RwLock<SystemMode>>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<DurableStoreClient>,
        cache: Arc<RedisCacheAdapter>,
        users: Arc<UserRepository>,
        events: Arc<EventRepository>,
        ledger: Arc<Ledger>,
        limiter: Arc<Limiter>,
        tokens: Arc<Tokens>,
        narrative: Arc<Narrative>,
        jwt_secret: Arc<str>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            store,
            cache,
            users,
            events,
            ledger,
            limiter,
            tokens,
            narrative,
            jwt_secret,
            cookie_secure,
            current_system_mode: Arc::new(RwLock::new(SystemMode::Operational)),
        }
    }

    pub fn set_mode(&self, target: SystemMode) {
        match self.current_system_mode.write() {
            Ok(mut guard) => {
                info!("🔄 [STATE_SHIFT]: Hub transitioning to mode: {:?}", target);
                *guard = target;
            }
            Err(poisoned) => tracing::error!("💀 [STATE_LOCK_FAULT]: mode lock poisoned: {}", poisoned),
        }
    }

    pub fn is_operational(&self) -> Result<(), String> {
        let guard = self.current_system_mode.read().map_err(|e| format!("LOCK_POISON_FAULT: {e}"))?;
        match &*guard {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(reason) => {
                warn!("⛔ [ACCESS_DENIED]: Hub in maintenance: {}", reason);
                Err(reason.clone())
            }
        }
    }
}
