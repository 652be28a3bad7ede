//! Lead management use cases

use super::auth::AuthService;
use super::cached_fetch::{fetch_list, fetch_single, CachedFetcher};
use super::cooldown::RefreshCooldown;
use super::error::{CrmError, Result};
use crate::domain::models::{Comment, Lead, LeadStatus};
use crate::domain::query::{LeadQuery, Page};
use crate::domain::session::Session;
use crate::domain::validation::{validate_comment, validate_lead};
use crate::infrastructure::cache::CacheKey;
use crate::infrastructure::client::{Webhook, WebhookRequest};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct LeadService {
    webhook: Arc<dyn Webhook>,
    fetcher: CachedFetcher,
    auth: Arc<AuthService>,
    cooldown: Arc<Mutex<RefreshCooldown>>,
}

impl LeadService {
    pub fn new(
        webhook: Arc<dyn Webhook>,
        fetcher: CachedFetcher,
        auth: Arc<AuthService>,
        cooldown: Arc<Mutex<RefreshCooldown>>,
    ) -> Self {
        Self {
            webhook,
            fetcher,
            auth,
            cooldown,
        }
    }

    fn list_key(session: &Session) -> CacheKey {
        CacheKey::Leads {
            emp_id: session.user.emp_id.clone(),
            email: session.user.email.clone(),
        }
    }

    /// Leads visible to the logged-in employee
    pub async fn list(&self, force: bool) -> Result<Vec<Lead>> {
        let session = self.auth.require()?;
        let request = WebhookRequest::Leads {
            emp_id: session.user.emp_id.clone(),
            email: session.user.email.clone(),
        };

        self.fetcher
            .get_or_fetch(Self::list_key(&session), Some(session.owner()), force, || {
                fetch_list(self.webhook.as_ref(), &request)
            })
            .await
    }

    /// Filtered, sorted page of the lead list
    pub async fn query(&self, query: &LeadQuery, force: bool) -> Result<Page<Lead>> {
        let leads = self.list(force).await?;
        Ok(query.apply(&leads))
    }

    pub async fn details(&self, lead_id: &str) -> Result<Lead> {
        let session = self.auth.require()?;
        let key = CacheKey::LeadDetails {
            lead_id: lead_id.to_string(),
        };
        let request = WebhookRequest::LeadDetails {
            lead_id: lead_id.to_string(),
        };

        self.fetcher
            .get_or_fetch(key, Some(session.owner()), false, || {
                fetch_single(self.webhook.as_ref(), &request)
            })
            .await
    }

    pub async fn comments(&self, lead_id: &str) -> Result<Vec<Comment>> {
        let session = self.auth.require()?;
        let key = CacheKey::LeadComments {
            lead_id: lead_id.to_string(),
        };
        let request = WebhookRequest::GetComments {
            lead_id: lead_id.to_string(),
        };

        self.fetcher
            .get_or_fetch(key, Some(session.owner()), false, || {
                fetch_list(self.webhook.as_ref(), &request)
            })
            .await
    }

    /// Save an edited lead
    pub async fn update(&self, lead: Lead) -> Result<()> {
        let session = self.auth.require()?;
        validate_lead(&lead)?;

        let lead_id = lead.id.clone();
        self.webhook.call(&WebhookRequest::UpdateLead(lead)).await?;

        self.invalidate_after_write(&session, &lead_id);
        info!(lead_id = %lead_id, "Lead updated");
        Ok(())
    }

    pub async fn change_status(&self, lead_id: &str, status: LeadStatus) -> Result<()> {
        let session = self.auth.require()?;

        let request = WebhookRequest::StatusChange {
            lead_id: lead_id.to_string(),
            status: status.clone(),
            emp_id: session.user.emp_id.clone(),
        };
        self.webhook.call(&request).await?;

        self.invalidate_after_write(&session, lead_id);
        info!(lead_id = %lead_id, "Lead status changed to {}", status);
        Ok(())
    }

    pub async fn post_comment(&self, lead_id: &str, text: &str) -> Result<()> {
        let session = self.auth.require()?;
        validate_comment(text)?;

        let request = WebhookRequest::PostComment {
            lead_id: lead_id.to_string(),
            emp_id: session.user.emp_id.clone(),
            comment: text.trim().to_string(),
        };
        self.webhook.call(&request).await?;

        self.fetcher.invalidate(&CacheKey::LeadComments {
            lead_id: lead_id.to_string(),
        });
        debug!(lead_id = %lead_id, "Comment posted");
        Ok(())
    }

    /// Manual refresh: drop every lead-related entry and refetch the list
    ///
    /// Rejected with `CooldownActive` inside the cooldown window.
    pub async fn refresh(&self) -> Result<Vec<Lead>> {
        let session = self.auth.require()?;

        self.cooldown
            .lock()
            .try_acquire(self.fetcher.now())
            .map_err(|remaining| CrmError::CooldownActive(remaining.num_seconds().max(1)))?;

        let removed = self.fetcher.invalidate_where(|key| {
            matches!(
                key,
                CacheKey::Leads { .. }
                    | CacheKey::LeadDetails { .. }
                    | CacheKey::LeadComments { .. }
                    | CacheKey::LeadTasks { .. }
            )
        });
        info!(emp_id = %session.user.emp_id, "Manual refresh, dropped {} cached entries", removed);

        self.list(true).await
    }

    fn invalidate_after_write(&self, session: &Session, lead_id: &str) {
        self.fetcher.invalidate(&Self::list_key(session));
        self.fetcher.invalidate_lead(lead_id);
    }
}
