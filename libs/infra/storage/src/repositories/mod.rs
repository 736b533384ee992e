// [libs/infra/storage/src/repositories/mod.rs]
/*!
 * APARATO: REPOSITORIOS DE PERSISTENCIA (ESTRATO L3)
 * RESPONSABILIDAD: IMPLEMENTACIONES CONCRETAS DE LOS PUERTOS DE DOMINIO
 */

pub mod energy;
pub mod events;
pub mod ratelimit;
pub mod sessions;
pub mod users;

pub use energy::EnergyRepository;
pub use events::EventRepository;
pub use ratelimit::BlockRepository;
pub use sessions::SessionRepository;
pub use users::UserRepository;
