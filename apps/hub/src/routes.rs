// [apps/hub/src/routes.rs]
/*!
 * APARATO: TOPOLOGIA DE RUTAS DEL HUB (ESTRATO L4)
 * RESPONSABILIDAD: MONTAJE DEL ARBOL DE ENDPOINTS Y CAPAS DE MIDDLEWARE
 *
 * Capas aplicadas de adentro hacia afuera: autenticacion solo sobre el
 * subarbol protegido, limitacion de tasa y salud sobre toda la API,
 * correlacion y CORS en la raiz.
 */

use axum::http::{header, Method};
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, billing, energy, monitoring, narrative};
use crate::middleware::{auth_guard, correlation_guard, health_guard, rate_limit_guard};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // Subarbol que exige `Authorization: Bearer` o la cookie `phoenix_session`.
    let protected_auth = Router::new()
        .route("/me", get(auth::me))
        .route("/sessions", get(auth::list_sessions))
        .route("/sessions/:session_id", delete(auth::revoke_session))
        .route("/logout-all", post(auth::logout_all))
        .route("/logout-secure", post(auth::logout_secure))
        .route("/luna/delegate-specialist", post(auth::delegate_specialist))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/secure-session", post(auth::secure_session))
        .route("/luna/validate-specialist", post(auth::validate_specialist))
        .merge(protected_auth);

    let energy_routes = Router::new()
        .route("/can-perform", post(energy::can_perform))
        .route("/balance", get(energy::balance))
        .route("/consume", post(energy::consume))
        .route("/refund", post(energy::refund))
        .route("/refund-eligibility/:user_id/:event_id", get(energy::refund_eligibility))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let billing_routes = Router::new()
        .route("/create-intent", post(billing::create_billing_intent))
        .route("/confirm-payment", post(billing::confirm_payment))
        .route("/history/:user_id", get(billing::history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let narrative_routes = Router::new()
        .route("/events", post(narrative::record_event))
        .route("/context/:user_id", get(narrative::context))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let monitoring_routes = Router::new()
        .route("/health", get(monitoring::health))
        .route("/ready", get(monitoring::ready))
        .route("/metrics", get(monitoring::metrics));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/luna/energy", energy_routes)
        .nest("/billing", billing_routes)
        .nest("/narrative", narrative_routes)
        .nest("/monitoring", monitoring_routes)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_guard))
        .layer(middleware::from_fn_with_state(state.clone(), health_guard))
        .layer(middleware::from_fn(correlation_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
