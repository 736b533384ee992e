// [libs/domain/narrative/src/errors.rs]
/*!
 * APARATO: NARRATIVE ANALYZER FAULTS (ESTRATO L2)
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("[L2_NARRATIVE_FAULT] registro de eventos no disponible: {0}")]
    EventSourceUnavailable(String),

    #[error("[L2_NARRATIVE_FAULT] cache de contexto no disponible: {0}")]
    CacheUnavailable(String),
}
