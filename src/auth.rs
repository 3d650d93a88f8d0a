//! Login, logout and the stored identity

use crate::error::Result;
use crate::http::ApiClient;
use crate::session::{SessionStore, StoredSession};
use crate::types::{AuthResponse, LoginCredentials, User};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const LOGIN_ENDPOINT: &str = "/api/auth/login";

/// Session lifecycle on top of an [`ApiClient`]
///
/// Shares the client's session store, so a successful login is visible to
/// the very next request.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn session(&self) -> &Arc<dyn SessionStore> {
        self.client.session()
    }

    /// Exchange credentials for a token and persist it with the user
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User> {
        let response: AuthResponse = self.client.post_json(LOGIN_ENDPOINT, credentials).await?;
        let user_json = serde_json::to_string(&response.user)?;
        self.session()
            .set(StoredSession::new(response.access_token).with_user(user_json))?;

        info!(user_id = response.user.id, role = %response.user.role, "Logged in");
        Ok(response.user)
    }

    /// Forget token and user
    pub fn logout(&self) -> Result<()> {
        self.session().clear()?;
        info!("Logged out");
        Ok(())
    }

    /// User restored from storage; needs both token and user
    ///
    /// A stored user that no longer parses clears the whole session.
    pub fn current_user(&self) -> Option<User> {
        let stored = self.session().get()?;
        let raw = stored.user?;

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Stored user unreadable, clearing session: {}", e);
                if let Err(e) = self.session().clear() {
                    debug!("Failed to clear session: {}", e);
                }
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Pipeline;
    use crate::session::MemorySession;
    use crate::test_support::{CountingNavigator, StubTransport};
    use reqwest::header::AUTHORIZATION;
    use reqwest::{Method, StatusCode};

    const LOGIN_OK: &str = r#"{"access_token":"abc","token_type":"bearer","user":{"id":4,"email":"nurse@hms.test","first_name":"Amina","last_name":"Otieno","role":"nurse","is_active":true}}"#;

    fn auth(transport: Arc<StubTransport>, session: Arc<MemorySession>) -> AuthService {
        let pipeline = Pipeline::standard(session.clone(), Arc::new(CountingNavigator::default()));
        AuthService::new(ApiClient::from_parts("http://hms.test", transport, pipeline, session))
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials {
            email: "nurse@hms.test".into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn test_login_stores_token_and_user() {
        let transport = Arc::new(StubTransport::ok(LOGIN_OK));
        let session = Arc::new(MemorySession::new());
        let auth = auth(transport.clone(), session.clone());

        let user = auth.login(&credentials()).await.unwrap();

        assert_eq!(user.full_name(), "Amina Otieno");
        assert_eq!(session.token().as_deref(), Some("abc"));
        assert_eq!(auth.current_user(), Some(user));

        let sent = transport.requests().remove(0);
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.path, LOGIN_ENDPOINT);
        assert!(sent.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_no_session() {
        let transport = Arc::new(StubTransport::status(StatusCode::UNAUTHORIZED, r#"{"detail":"bad"}"#));
        let session = Arc::new(MemorySession::new());
        let auth = auth(transport, session.clone());

        assert!(auth.login(&credentials()).await.is_err());
        assert!(session.get().is_none());
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_logout_clears_both() {
        let session = Arc::new(MemorySession::new());
        session
            .set(StoredSession::new("abc").with_user(r#"{"id":1}"#))
            .unwrap();
        let auth = auth(Arc::new(StubTransport::ok("{}")), session.clone());

        auth.logout().unwrap();
        assert!(session.get().is_none());
    }

    #[test]
    fn test_token_without_user_is_not_a_login() {
        let session = Arc::new(MemorySession::with_token("abc"));
        let auth = auth(Arc::new(StubTransport::ok("{}")), session.clone());

        assert!(auth.current_user().is_none());
        // Token alone is left in place
        assert_eq!(session.token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_unparsable_user_clears_session() {
        let session = Arc::new(MemorySession::new());
        session
            .set(StoredSession::new("abc").with_user("{not json"))
            .unwrap();
        let auth = auth(Arc::new(StubTransport::ok("{}")), session.clone());

        assert!(auth.current_user().is_none());
        assert!(session.get().is_none());
    }
}
