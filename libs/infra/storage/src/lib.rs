// [libs/infra/storage/src/lib.rs]
/*!
 * APARATO: LIBRERIA DE PERSISTENCIA DURABLE (ESTRATO L3)
 * RESPONSABILIDAD: ADAPTADOR LIBSQL/TURSO PARA TODOS LOS PUERTOS DE DOMINIO
 *
 * Un unico enlace (`DurableStoreClient`) respalda cinco repositorios, cada
 * uno satisfaciendo los puertos hexagonales declarados por `energy`,
 * `narrative`, `ratelimit` y `tokens`. Ninguna de esas librerias de dominio
 * conoce a `libsql`; esta es la unica frontera donde SQL entra al sistema.
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DurableStoreClient;
pub use errors::StorageError;
pub use repositories::{BlockRepository, EnergyRepository, EventRepository, SessionRepository, UserRepository};
pub use repositories::energy::EnergyPlanProbeAdapter;
