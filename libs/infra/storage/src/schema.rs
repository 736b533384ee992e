// [libs/infra/storage/src/schema.rs]
/*!
 * APARATO: SOVEREIGN DATABASE SCHEMA (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Las tablas base se crean con `CREATE TABLE IF NOT EXISTS`, calcado del
 * patron de idempotencia del sistema de origen; columnas nuevas se agregan
 * via `ALTER TABLE ... ADD COLUMN` y el fallo "duplicate column name" se
 * trata como exito silencioso, no como error de arranque.
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    ("TABLE_USERS", r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            plan TEXT NOT NULL DEFAULT 'free',
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#),
    ("TABLE_USER_ENERGY", r#"
        CREATE TABLE IF NOT EXISTS user_energy (
            user_id TEXT PRIMARY KEY,
            current_energy REAL NOT NULL,
            max_energy REAL NOT NULL,
            total_consumed REAL NOT NULL DEFAULT 0,
            total_purchased REAL NOT NULL DEFAULT 0,
            subscription_type TEXT NOT NULL DEFAULT 'free',
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_ENERGY_TRANSACTIONS", r#"
        CREATE TABLE IF NOT EXISTS energy_transactions (
            transaction_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            action_type TEXT NOT NULL,
            amount REAL NOT NULL,
            reason TEXT NOT NULL,
            energy_before REAL NOT NULL,
            energy_after REAL NOT NULL,
            context TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );
    "#),
    ("TABLE_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS events (
            event_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            app_source TEXT NOT NULL,
            event_data TEXT NOT NULL DEFAULT '{}',
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );
    "#),
    ("TABLE_SESSIONS", r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            token_hash TEXT NOT NULL UNIQUE,
            jti TEXT NOT NULL,
            device_label TEXT NOT NULL DEFAULT '',
            user_agent TEXT NOT NULL DEFAULT '',
            ip TEXT NOT NULL DEFAULT '',
            parent_id TEXT,
            expires_at TEXT NOT NULL,
            used_at TEXT,
            revoked_at TEXT,
            created_at TEXT NOT NULL,
            last_seen TEXT NOT NULL
        );
    "#),
    ("TABLE_RATE_LIMITS", r#"
        CREATE TABLE IF NOT EXISTS rate_limits (
            scope TEXT NOT NULL,
            identifier_hash TEXT NOT NULL,
            blocked_until TEXT NOT NULL,
            block_duration_seconds INTEGER NOT NULL,
            PRIMARY KEY (scope, identifier_hash)
        );
    "#),
];

const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("USER_ENERGY_LEGACY_COLUMN_GUARD", "ALTER TABLE user_energy ADD COLUMN legacy_migrated INTEGER DEFAULT 0"),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_EVENTS_USER_CREATED", "CREATE INDEX IF NOT EXISTS idx_events_user_created ON events(user_id, created_at DESC);"),
    ("IDX_EVENTS_USER_TYPE_CREATED", "CREATE INDEX IF NOT EXISTS idx_events_user_type_created ON events(user_id, event_type, created_at DESC);"),
    ("IDX_SESSIONS_TOKEN_HASH", "CREATE INDEX IF NOT EXISTS idx_sessions_token_hash ON sessions(token_hash);"),
    ("IDX_SESSIONS_USER", "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);"),
    ("IDX_RATE_LIMITS_SCOPE_ID", "CREATE INDEX IF NOT EXISTS idx_rate_limits_scope_identifier ON rate_limits(scope, identifier_hash);"),
    ("IDX_TRANSACTIONS_USER", "CREATE INDEX IF NOT EXISTS idx_transactions_user ON energy_transactions(user_id, created_at DESC);"),
];

/// Ejecuta la secuencia maestra de sincronizacion del esquema estructural.
///
/// # Errors:
/// Retorna error si alguna tabla base falla en solidificarse, indicando
/// un colapso en el enlace con la base de datos durable.
#[instrument(skip(database_connection))]
pub async fn apply_full_sovereign_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Ledger schema level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in BASE_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await.with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => debug!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await.with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
