// [libs/domain/energy/src/catalog.rs]
/*!
 * APARATO: ACTION & PACK CATALOGS (ESTRATO L2 - CONFIGURACIÓN ESTÁTICA)
 * RESPONSABILIDAD: TABLA DE COSTOS Y PAQUETES DE RECARGA
 */

/// Costo de energía (en puntos porcentuales 0-100) y elegibilidad de
/// reembolso para una acción nominal del catálogo.
#[derive(Debug, Clone, Copy)]
pub struct ActionDefinition {
    pub name: &'static str,
    pub cost: f64,
    pub refund_eligible: bool,
}

/// Catálogo estático de acciones medidas por el Hub. Las apps satélite
/// consultan este catálogo indirectamente vía `can_perform`/`consume`.
pub const ACTION_CATALOG: &[ActionDefinition] = &[
    ActionDefinition { name: "analyse_cv_complete", cost: 25.0, refund_eligible: true },
    ActionDefinition { name: "mirror_match", cost: 30.0, refund_eligible: true },
    ActionDefinition { name: "letter_generation", cost: 20.0, refund_eligible: true },
    ActionDefinition { name: "letter_tone_adjustment", cost: 5.0, refund_eligible: true },
    ActionDefinition { name: "aube_career_discovery", cost: 15.0, refund_eligible: true },
    ActionDefinition { name: "session_zero_onboarding", cost: 0.0, refund_eligible: false },
    ActionDefinition { name: "narrative_context_refresh", cost: 0.0, refund_eligible: false },
];

pub fn lookup_action(name: &str) -> Option<&'static ActionDefinition> {
    ACTION_CATALOG.iter().find(|action| action.name == name)
}

/// Paquete de recarga de energía, pagado de una sola vez, o suscripción.
#[derive(Debug, Clone, Copy)]
pub struct EnergyPackDefinition {
    pub code: &'static str,
    pub price_cents: u32,
    pub energy_units: f64,
    pub first_purchase_bonus_pct: f64,
    pub currency: &'static str,
    pub is_unlimited_subscription: bool,
}

pub const ENERGY_PACKS: &[EnergyPackDefinition] = &[
    EnergyPackDefinition {
        code: "cafe_luna",
        price_cents: 299,
        energy_units: 100.0,
        first_purchase_bonus_pct: 0.10,
        currency: "eur",
        is_unlimited_subscription: false,
    },
    EnergyPackDefinition {
        code: "petit_dej_luna",
        price_cents: 599,
        energy_units: 220.0,
        first_purchase_bonus_pct: 0.0,
        currency: "eur",
        is_unlimited_subscription: false,
    },
    EnergyPackDefinition {
        code: "repas_luna",
        price_cents: 999,
        energy_units: 400.0,
        first_purchase_bonus_pct: 0.0,
        currency: "eur",
        is_unlimited_subscription: false,
    },
    EnergyPackDefinition {
        code: "luna_unlimited",
        price_cents: 1999,
        energy_units: 0.0,
        first_purchase_bonus_pct: 0.0,
        currency: "eur",
        is_unlimited_subscription: true,
    },
];

pub fn lookup_pack(code: &str) -> Option<&'static EnergyPackDefinition> {
    ENERGY_PACKS.iter().find(|pack| pack.code == code)
}

/// Paquete mas barato cuyo `energy_units` cubre el deficit, para que el
/// cliente reciba de inmediato una accion concreta tras un 402. Si ningun
/// paquete de una sola compra cubre el deficit, sugiere el mas grande.
pub fn suggest_pack_for_deficit(deficit: f64) -> &'static str {
    let mut one_shot: Vec<&EnergyPackDefinition> = ENERGY_PACKS.iter().filter(|pack| !pack.is_unlimited_subscription).collect();
    one_shot.sort_by(|a, b| a.energy_units.partial_cmp(&b.energy_units).unwrap());

    one_shot
        .iter()
        .find(|pack| pack.energy_units >= deficit)
        .or_else(|| one_shot.last())
        .map(|pack| pack.code)
        .unwrap_or("cafe_luna")
}
