//! Application-level errors

use crate::domain::validation::ValidationError;
use crate::infrastructure::cache::CacheError;
use crate::infrastructure::client::WebhookError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session expired")]
    SessionExpired,
}

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Refresh available again in {0} seconds")]
    CooldownActive(i64),
}

impl CrmError {
    /// Whether the failure was caught before contacting the backend
    pub fn is_validation(&self) -> bool {
        matches!(self, CrmError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
