//! Session lifecycle: login, restore, refresh, logout
//!
//! The session is held here and handed to the facades; nothing else reads
//! the persisted profile directly.

use super::cached_fetch::CachedFetcher;
use super::error::{AuthError, CrmError, Result};
use crate::domain::session::{Route, Session};
use crate::domain::validation::validate_email;
use crate::infrastructure::cache::CacheKey;
use crate::infrastructure::client::webhook::{decode_single, AuthResponse};
use crate::infrastructure::client::{Webhook, WebhookError, WebhookRequest};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AuthService {
    webhook: Arc<dyn Webhook>,
    fetcher: CachedFetcher,
    session: RwLock<Option<Session>>,
}

impl AuthService {
    pub fn new(webhook: Arc<dyn Webhook>, fetcher: CachedFetcher) -> Self {
        Self {
            webhook,
            fetcher,
            session: RwLock::new(None),
        }
    }

    /// Log in and persist the resulting session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let response = self.authenticate(email, password).await?;
        let session = Session::new(response.token, response.user, self.fetcher.now());

        self.install(session.clone());
        info!(emp_id = %session.user.emp_id, "Logged in as {}", session.user.name);
        Ok(session)
    }

    /// Restore a persisted session that is still within its TTL
    pub fn restore(&self) -> Option<Session> {
        let session: Session = self.fetcher.cached(&CacheKey::AuthProfile, None)?;

        let ttl = self.fetcher.ttls().ttl_for(&CacheKey::AuthProfile);
        if session.is_expired(self.fetcher.now(), ttl) {
            debug!("Persisted session expired");
            self.fetcher.invalidate(&CacheKey::AuthProfile);
            return None;
        }

        self.webhook.set_token(Some(session.token.clone()));
        *self.session.write() = Some(session.clone());
        info!(emp_id = %session.user.emp_id, "Restored session");
        Some(session)
    }

    /// Re-login with the same account, replacing the token
    pub async fn refresh(&self, email: &str, password: &str) -> Result<Session> {
        let current = self.current().ok_or(AuthError::NotAuthenticated)?;
        let response = self.authenticate(email, password).await?;

        if response.user.emp_id != current.user.emp_id {
            warn!("Refresh returned a different account, starting a fresh session");
            self.fetcher.clear();
        }

        let mut session = current;
        session.refresh(response.token, response.user, self.fetcher.now());
        self.install(session.clone());
        debug!("Session refreshed");
        Ok(session)
    }

    /// Forget the session and wipe every cached response
    pub fn logout(&self) {
        *self.session.write() = None;
        self.webhook.set_token(None);
        self.fetcher.clear();
        info!("Logged out");
    }

    pub fn current(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Current session, or `NotAuthenticated` / `SessionExpired`
    pub fn require(&self) -> Result<Session> {
        let session = self.current().ok_or(AuthError::NotAuthenticated)?;

        let ttl = self.fetcher.ttls().ttl_for(&CacheKey::AuthProfile);
        if session.is_expired(self.fetcher.now(), ttl) {
            return Err(AuthError::SessionExpired.into());
        }
        Ok(session)
    }

    /// Where a visitor asking for `requested` ends up
    pub fn route(&self, requested: Route) -> Route {
        let session = self.require().ok();
        requested.guard(session.as_ref())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthResponse> {
        validate_email(email)?;

        let request = WebhookRequest::Login {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let value = match self.webhook.call(&request).await {
            Ok(value) => value,
            Err(WebhookError::ApiError { status: 401 | 403, .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e.into()),
        };

        let response: AuthResponse = decode_single(value).map_err(|e| {
            debug!("Login response not accepted: {}", e);
            CrmError::Auth(AuthError::InvalidCredentials)
        })?;

        if response.token.trim().is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(response)
    }

    fn install(&self, session: Session) {
        self.webhook.set_token(Some(session.token.clone()));
        self.fetcher
            .store(CacheKey::AuthProfile, &session, Some(&session.user.emp_id));
        if let Err(e) = self.fetcher.persist() {
            warn!("Failed to persist session: {}", e);
        }
        *self.session.write() = Some(session);
    }
}
