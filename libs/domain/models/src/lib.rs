// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS (ESTRATO L2 - SINGLE SOURCE OF TRUTH)
 * CLASIFICACIÓN: SHARED KERNEL
 * RESPONSABILIDAD: TIPOS NOMINALES COMPARTIDOS POR TODO EL DOMINIO
 * =================================================================
 */

pub mod event;
pub mod plan;
pub mod user;

pub use event::{event_types, Event, MAX_EVENT_DATA_BYTES};
pub use plan::Plan;
pub use user::{validate_user_id, User, MAX_USER_ID_LEN};
