// [apps/hub/src/orchestration/mod.rs]
/*!
 * APARATO: TUBERIAS DE ORQUESTACION (ESTRATO L4)
 * RESPONSABILIDAD: COMPOSICION DE LOS SERVICIOS DE DOMINIO EN FLUJOS HTTP
 *
 * Los servicios de dominio (`EnergyLedger`, `RateLimiter`, `TokenService`,
 * `NarrativeAnalyzer`) son deliberadamente ciegos a HTTP y a la nocion de
 * "quien pide que". Este modulo cose esas piezas en los tres flujos que
 * el Hub expone: la accion medida (rate-limit + precheck + consumo), el
 * reembolso idempotente, y la facturacion de paquetes de energia.
 */

pub mod billing;
pub mod energy;
