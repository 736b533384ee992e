// [apps/hub/src/config.rs]
/*!
 * APARATO: CONFIGURACION DE ARRANQUE DEL HUB (ESTRATO L4)
 * RESPONSABILIDAD: LECTURA UNICA DE VARIABLES DE ENTORNO EN UN TIPO ESTATICO
 *
 * Leida una sola vez al arrancar el proceso; ningun handler vuelve a
 * tocar `std::env` en caliente.
 */

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub database_url: String,
    pub turso_auth_token: Option<String>,
    pub redis_url: String,
    pub jwt_secret_key: String,
    pub port: u16,
    pub cookie_secure: bool,
}

impl HubConfig {
    /// Lee la configuracion de arranque del entorno. El mensaje de error
    /// es texto plano: esta funcion corre antes de que exista cualquier
    /// sobre de error HTTP al que traducirlo.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL no definido en el entorno de ejecucion".to_string())?;

        let jwt_secret_key = std::env::var("JWT_SECRET_KEY")
            .map_err(|_| "JWT_SECRET_KEY no definido en el entorno de ejecucion".to_string())?;

        let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let turso_auth_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let port: u16 = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().unwrap_or(3000);
        let cookie_secure = std::env::var("COOKIE_SECURE").map(|v| v != "false" && v != "0").unwrap_or(true);

        Ok(Self { database_url, turso_auth_token, redis_url, jwt_secret_key, port, cookie_secure })
    }
}
