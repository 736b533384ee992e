// [libs/domain/tokens/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TOKEN DOMAIN (ESTRATO L2)
 * CLASIFICACIÓN: DOMAIN LOGIC
 * RESPONSABILIDAD: IDENTIDAD, SESIONES Y DELEGACION ESCALONADA DE AUTORIDAD
 * =================================================================
 */

pub mod device;
pub mod errors;
pub mod ports;
pub mod service;
pub mod types;

pub use device::extract_device_label;
pub use errors::TokenError;
pub use ports::{SessionRecord, SessionStore, TokenEventSink};
pub use service::{IssuedSession, TokenService, ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS};
pub use types::{Claims, DelegationContext, LunaContext, SpecialistName};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Default)]
    struct InMemorySessions {
        rows: Mutex<HashMap<Uuid, SessionRecord>>,
    }

    #[async_trait]
    impl SessionStore for InMemorySessions {
        async fn create_session(
            &self,
            user_id: &str,
            token_hash: &str,
            jti: &str,
            device_label: &str,
            user_agent: &str,
            ip: &str,
            expires_at: chrono::DateTime<Utc>,
            parent_id: Option<Uuid>,
        ) -> Result<SessionRecord, TokenError> {
            let record = SessionRecord {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                token_hash: token_hash.to_string(),
                jti: jti.to_string(),
                device_label: device_label.to_string(),
                user_agent: user_agent.to_string(),
                ip: ip.to_string(),
                parent_id,
                expires_at,
                used_at: None,
                revoked_at: None,
                created_at: Utc::now(),
                last_seen: Utc::now(),
            };
            self.rows.lock().unwrap().insert(record.id, record.clone());
            Ok(record)
        }

        async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<SessionRecord>, TokenError> {
            Ok(self.rows.lock().unwrap().values().find(|r| r.token_hash == token_hash).cloned())
        }

        async fn get_session(&self, id: Uuid) -> Result<Option<SessionRecord>, TokenError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn mark_used(&self, id: Uuid) -> Result<(), TokenError> {
            if let Some(record) = self.rows.lock().unwrap().get_mut(&id) {
                record.used_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn revoke(&self, id: Uuid) -> Result<(), TokenError> {
            if let Some(record) = self.rows.lock().unwrap().get_mut(&id) {
                record.revoked_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn revoke_all_for_user(&self, user_id: &str, except: Option<Uuid>) -> Result<u32, TokenError> {
            let mut count = 0;
            let mut rows = self.rows.lock().unwrap();
            for record in rows.values_mut() {
                if record.user_id == user_id && record.revoked_at.is_none() && Some(record.id) != except {
                    record.revoked_at = Some(Utc::now());
                    count += 1;
                }
            }
            Ok(count)
        }

        async fn list_active_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, TokenError> {
            let now = Utc::now();
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.user_id == user_id && r.is_active(now))
                .cloned()
                .collect())
        }
    }

    struct NullEvents;

    #[async_trait]
    impl TokenEventSink for NullEvents {
        async fn append(&self, _user_id: &str, _event_type: &str, _event_data: Value) -> Result<Uuid, TokenError> {
            Ok(Uuid::new_v4())
        }
    }

    fn service() -> TokenService<InMemorySessions, NullEvents> {
        TokenService::new(b"test-signing-secret".to_vec(), Arc::new(InMemorySessions::default()), Arc::new(NullEvents))
    }

    fn scope() -> Vec<String> {
        vec!["luna-central".to_string(), "luna-cv".to_string(), "luna-letters".to_string()]
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_access_token() {
        let svc = service();
        let issued = svc.login("user-1", "127.0.0.1", "Mozilla/5.0 (iPhone; Mobile)", LunaContext::default(), scope()).await.unwrap();
        let claims = svc.verify_access_token(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(!claims.is_specialist_token());
    }

    #[tokio::test]
    async fn rotate_revokes_old_token_and_issues_a_new_one() {
        let svc = service();
        let first = svc.login("user-2", "127.0.0.1", "", LunaContext::default(), scope()).await.unwrap();
        let second = svc.rotate(&first.refresh_token, "127.0.0.1", "", LunaContext::default(), scope()).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.jti, second.jti);
    }

    #[tokio::test]
    async fn reusing_a_rotated_refresh_token_revokes_the_whole_chain() {
        let svc = service();
        let first = svc.login("user-3", "127.0.0.1", "", LunaContext::default(), scope()).await.unwrap();
        let _second = svc.rotate(&first.refresh_token, "127.0.0.1", "", LunaContext::default(), scope()).await.unwrap();

        // Reuse of the already-rotated first token must be detected and
        // must revoke every session in the chain, not just deny the reuse.
        let err = svc.rotate(&first.refresh_token, "10.0.0.1", "", LunaContext::default(), scope()).await.unwrap_err();
        assert!(matches!(err, TokenError::ReuseDetected));

        let sessions = svc.get_user_sessions("user-3").await.unwrap();
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn delegation_rejects_permissions_outside_parent_scope() {
        let svc = service();
        let issued = svc.login("user-4", "127.0.0.1", "", LunaContext::default(), scope()).await.unwrap();
        let parent = svc.verify_access_token(&issued.access_token).unwrap();

        let err = svc
            .delegate_specialist(
                &parent,
                SpecialistName::LunaAube,
                vec!["luna-aube".to_string()],
                DelegationContext { target_module: "aube".to_string(), reason: "career discovery".to_string() },
                5,
            )
            .unwrap_err();
        assert!(matches!(err, TokenError::PermissionsNotSubset));
    }

    #[tokio::test]
    async fn delegation_succeeds_within_scope_and_caps_duration() {
        let svc = service();
        let issued = svc.login("user-5", "127.0.0.1", "", LunaContext::default(), scope()).await.unwrap();
        let parent = svc.verify_access_token(&issued.access_token).unwrap();

        let child_token = svc
            .delegate_specialist(
                &parent,
                SpecialistName::LunaCv,
                vec!["luna-cv".to_string()],
                DelegationContext { target_module: "cv".to_string(), reason: "cv analysis".to_string() },
                60,
            )
            .unwrap();

        let child = svc.verify_access_token(&child_token).unwrap();
        assert!(child.exp <= parent.exp);
        assert_eq!(child.specialist_name.as_deref(), Some("luna-cv"));
    }

    #[tokio::test]
    async fn a_child_token_cannot_sub_delegate() {
        let svc = service();
        let issued = svc.login("user-6", "127.0.0.1", "", LunaContext::default(), scope()).await.unwrap();
        let parent = svc.verify_access_token(&issued.access_token).unwrap();
        let child_token = svc
            .delegate_specialist(
                &parent,
                SpecialistName::LunaRise,
                vec!["luna-central".to_string()],
                DelegationContext { target_module: "rise".to_string(), reason: "progress check".to_string() },
                5,
            )
            .unwrap();
        let child = svc.verify_access_token(&child_token).unwrap();

        let err = svc
            .delegate_specialist(
                &child,
                SpecialistName::LunaAube,
                vec!["luna-central".to_string()],
                DelegationContext { target_module: "aube".to_string(), reason: "nested".to_string() },
                5,
            )
            .unwrap_err();
        assert!(matches!(err, TokenError::SubDelegationForbidden));
    }
}
