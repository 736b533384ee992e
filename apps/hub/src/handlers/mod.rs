// [apps/hub/src/handlers/mod.rs]
/*!
 * APARATO: INDICE DE ADAPTADORES DE ENTRADA (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICION NOMINAL DE LOS PUNTOS DE ENTRADA HTTP
 *
 * - auth:       registro, login, rotacion, sesiones, delegacion a especialistas.
 * - billing:    intenciones de pago y confirmacion idempotente de compra.
 * - energy:     saldo, prechequeo, consumo y reembolso medidos.
 * - monitoring: salud, disponibilidad y metricas de limitacion de tasa.
 * - narrative:  ingesta de eventos y reconstruccion de contexto.
 */

pub mod auth;
pub mod billing;
pub mod energy;
pub mod monitoring;
pub mod narrative;
