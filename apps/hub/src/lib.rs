// [apps/hub/src/lib.rs]
/*!
 * APARATO: RAIZ DE LA LIBRERIA DEL HUB (ESTRATO L4)
 * RESPONSABILIDAD: DEFINICION DEL ARBOL DE MODULOS Y PRELUDIO DE IGNICION
 */

/// Configuracion de arranque leida una sola vez desde el entorno.
pub mod config;
/// Sobre de error HTTP unificado para toda la frontera de la API.
pub mod errors;
/// Adaptadores de entrada HTTP (autenticacion, energia, facturacion, narrativa, observabilidad).
pub mod handlers;
/// Nucleo de composicion: ensambla los puertos de dominio y levanta el servidor.
pub mod kernel;
/// Guardianes perimetrales: salud, correlacion, autenticacion, limitacion de tasa.
pub mod middleware;
/// Tuberias de aplicacion que combinan mas de un puerto de dominio por operacion.
pub mod orchestration;
/// Topologia de rutas HTTP del Hub.
pub mod routes;
/// Estado compartido clonable inyectado en cada handler de axum.
pub mod state;

/// Reexportacion minima para la ignicion desde `main.rs`.
pub mod prelude {
    pub use crate::config::HubConfig;
    pub use crate::kernel::HubKernel;
    pub use crate::state::{AppState, SystemMode};
}
