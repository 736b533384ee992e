// [libs/domain/tokens/src/service.rs]
/*!
 * APARATO: TOKEN SERVICE (ESTRATO L2 - NUCLEO DE IDENTIDAD)
 * RESPONSABILIDAD: EMISION/VALIDACION DE JWT, ROTACION DE REFRESH TOKENS,
 *                  DELEGACION DE TOKENS HIJO A ESPECIALISTAS
 */

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::device::extract_device_label;
use crate::errors::TokenError;
use crate::ports::{SessionRecord, SessionStore, TokenEventSink};
use crate::types::{Claims, DelegationContext, LunaContext, SpecialistName};

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Par de tokens emitidos por login inicial o por rotacion exitosa.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: Uuid,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService<S: SessionStore, E: TokenEventSink> {
    secret: Vec<u8>,
    sessions: Arc<S>,
    events: Arc<E>,
}

impl<S: SessionStore, E: TokenEventSink> TokenService<S, E> {
    pub fn new(secret: impl Into<Vec<u8>>, sessions: Arc<S>, events: Arc<E>) -> Self {
        Self { secret: secret.into(), sessions, events }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, TokenError> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| TokenError::PasswordHashFailure(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| TokenError::SigningFailure(e.to_string()))
    }

    /// Decodifica y valida firma/expiracion. Todo fallo, cualquiera sea su
    /// causa (expirado, mal firmado, algoritmo incorrecto, payload corrupto),
    /// colapsa en `InvalidToken` para no filtrar el motivo al llamador.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidToken)
    }

    fn generate_refresh_token() -> String {
        let mut bytes = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Crea una nueva sesion (login inicial o primer eslabon de una cadena
    /// de rotacion) y emite el par de tokens asociado.
    async fn issue_session(
        &self,
        user_id: &str,
        ip: &str,
        user_agent: &str,
        parent_id: Option<Uuid>,
        luna_context: LunaContext,
        microservice_scope: Vec<String>,
    ) -> Result<IssuedSession, TokenError> {
        let refresh_token = Self::generate_refresh_token();
        let token_hash = Self::hash_token(&refresh_token);
        let jti = Uuid::new_v4().to_string();
        let device_label = extract_device_label(user_agent);
        let now = Utc::now();
        let expires_at = now + ChronoDuration::days(REFRESH_TOKEN_TTL_DAYS);

        let record = self
            .sessions
            .create_session(user_id, &token_hash, &jti, &device_label, user_agent, ip, expires_at, parent_id)
            .await?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp(),
            jti: jti.clone(),
            session_id: record.id.to_string(),
            luna_context,
            microservice_scope,
            specialist_name: None,
            specialist_permissions: None,
            delegation_context: None,
            parent_jti: None,
        };
        let access_token = self.sign(&claims)?;

        Ok(IssuedSession { access_token, refresh_token, session_id: record.id, jti, expires_at })
    }

    pub async fn login(
        &self,
        user_id: &str,
        ip: &str,
        user_agent: &str,
        luna_context: LunaContext,
        microservice_scope: Vec<String>,
    ) -> Result<IssuedSession, TokenError> {
        let issued = self.issue_session(user_id, ip, user_agent, None, luna_context, microservice_scope).await?;
        self.events
            .append(
                user_id,
                luna_domain_models::event_types::SESSION_CREATED,
                json!({
                    "session_id": issued.session_id,
                    "jti": issued.jti,
                    "ip": ip,
                    "user_agent": user_agent,
                }),
            )
            .await?;
        Ok(issued)
    }

    /// Rotacion de un solo uso. Un segundo intento de rotar el mismo token
    /// (ya usado o revocado) revoca toda la cadena de sesiones del usuario.
    pub async fn rotate(
        &self,
        old_refresh_token: &str,
        ip: &str,
        user_agent: &str,
        luna_context: LunaContext,
        microservice_scope: Vec<String>,
    ) -> Result<IssuedSession, TokenError> {
        let token_hash = Self::hash_token(old_refresh_token);
        let record = self.sessions.find_by_token_hash(&token_hash).await?.ok_or(TokenError::RevokedToken)?;

        if record.revoked_at.is_some() || record.used_at.is_some() {
            self.sessions.revoke_all_for_user(&record.user_id, None).await?;
            self.events
                .append(
                    &record.user_id,
                    luna_domain_models::event_types::SESSION_REVOKED_ALL,
                    json!({ "reason": "refresh_token_reuse_detected", "jti": record.jti }),
                )
                .await?;
            return Err(TokenError::ReuseDetected);
        }

        if record.expires_at <= Utc::now() {
            return Err(TokenError::RevokedToken);
        }

        self.sessions.mark_used(record.id).await?;
        self.sessions.revoke(record.id).await?;

        let issued = self
            .issue_session(&record.user_id, ip, user_agent, Some(record.id), luna_context, microservice_scope)
            .await?;

        self.events
            .append(
                &record.user_id,
                luna_domain_models::event_types::SESSION_REFRESHED,
                json!({
                    "session_id": issued.session_id,
                    "jti_old": record.jti,
                    "jti_new": issued.jti,
                    "rotation_chain": record.id,
                }),
            )
            .await?;

        Ok(issued)
    }

    pub async fn revoke_session(&self, session_id: Uuid, user_id: &str) -> Result<(), TokenError> {
        let record = self.sessions.get_session(session_id).await?.ok_or(TokenError::SessionNotFound)?;
        if record.user_id != user_id {
            return Err(TokenError::SessionNotFound);
        }
        self.sessions.revoke(session_id).await?;
        self.events
            .append(
                user_id,
                luna_domain_models::event_types::SESSION_REVOKED,
                json!({ "session_id": session_id, "device_label": record.device_label }),
            )
            .await?;
        Ok(())
    }

    pub async fn revoke_all_sessions(&self, user_id: &str, except_session_id: Option<Uuid>) -> Result<u32, TokenError> {
        let revoked = self.sessions.revoke_all_for_user(user_id, except_session_id).await?;
        self.events
            .append(
                user_id,
                luna_domain_models::event_types::SESSION_REVOKED_ALL,
                json!({ "sessions_revoked": revoked, "except_session_id": except_session_id }),
            )
            .await?;
        Ok(revoked)
    }

    pub async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, TokenError> {
        self.sessions.list_active_sessions(user_id).await
    }

    /// Emite un token hijo delegado a un especialista. Rechaza sub-delegacion
    /// (un token hijo no puede presentarse como padre de otra delegacion),
    /// exige que los permisos solicitados sean subconjunto del scope del
    /// padre, y recorta `exp` al minimo entre la politica del especialista
    /// y el `exp` del token padre.
    pub fn delegate_specialist(
        &self,
        parent: &Claims,
        specialist: SpecialistName,
        requested_permissions: Vec<String>,
        delegation_context: DelegationContext,
        requested_duration_minutes: i64,
    ) -> Result<String, TokenError> {
        if parent.is_specialist_token() {
            return Err(TokenError::SubDelegationForbidden);
        }

        if !requested_permissions.iter().all(|perm| parent.microservice_scope.contains(perm)) {
            return Err(TokenError::PermissionsNotSubset);
        }

        if requested_duration_minutes > specialist.max_session_duration_minutes() {
            return Err(TokenError::DurationExceeded);
        }

        let now = Utc::now();
        let candidate_exp = (now + ChronoDuration::minutes(requested_duration_minutes)).timestamp();
        let exp = candidate_exp.min(parent.exp);

        let child = Claims {
            sub: parent.sub.clone(),
            iat: now.timestamp(),
            exp,
            jti: Uuid::new_v4().to_string(),
            session_id: parent.session_id.clone(),
            luna_context: parent.luna_context.clone(),
            microservice_scope: requested_permissions.clone(),
            specialist_name: Some(specialist.as_str().to_string()),
            specialist_permissions: Some(requested_permissions),
            delegation_context: Some(delegation_context),
            parent_jti: Some(parent.jti.clone()),
        };

        self.sign(&child)
    }

    /// Valida un token hijo y comprueba que su `specialist_permissions`
    /// cubra la accion requerida.
    pub fn validate_specialist_token(&self, token: &str, required_permission: &str) -> Result<Claims, TokenError> {
        let claims = self.verify_access_token(token)?;
        if !claims.is_specialist_token() {
            return Err(TokenError::InvalidToken);
        }
        let permissions = claims.specialist_permissions.as_ref().ok_or(TokenError::InvalidToken)?;
        if !permissions.iter().any(|perm| perm == required_permission) {
            return Err(TokenError::PermissionsNotSubset);
        }
        Ok(claims)
    }
}
