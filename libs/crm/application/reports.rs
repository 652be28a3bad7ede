//! Incentive and referral reporting

use super::auth::AuthService;
use super::cached_fetch::{fetch_list, CachedFetcher};
use super::error::Result;
use crate::domain::models::{Incentive, Referral};
use crate::domain::validation::validate_referral;
use crate::infrastructure::cache::CacheKey;
use crate::infrastructure::client::{Webhook, WebhookRequest};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ReportService {
    webhook: Arc<dyn Webhook>,
    fetcher: CachedFetcher,
    auth: Arc<AuthService>,
}

impl ReportService {
    pub fn new(webhook: Arc<dyn Webhook>, fetcher: CachedFetcher, auth: Arc<AuthService>) -> Self {
        Self {
            webhook,
            fetcher,
            auth,
        }
    }

    pub async fn incentives(&self, force: bool) -> Result<Vec<Incentive>> {
        let session = self.auth.require()?;
        let emp_id = session.user.emp_id.clone();
        let request = WebhookRequest::Incentives {
            emp_id: emp_id.clone(),
        };

        self.fetcher
            .get_or_fetch(CacheKey::Incentives { emp_id }, Some(session.owner()), force, || {
                fetch_list(self.webhook.as_ref(), &request)
            })
            .await
    }

    pub async fn referrals(&self, force: bool) -> Result<Vec<Referral>> {
        let session = self.auth.require()?;
        let emp_id = session.user.emp_id.clone();
        let request = WebhookRequest::Referrals {
            emp_id: emp_id.clone(),
        };

        self.fetcher
            .get_or_fetch(CacheKey::Referrals { emp_id }, Some(session.owner()), force, || {
                fetch_list(self.webhook.as_ref(), &request)
            })
            .await
    }

    /// Submit a referral under the logged-in employee
    pub async fn add_referral(&self, mut referral: Referral) -> Result<()> {
        let session = self.auth.require()?;
        validate_referral(&referral)?;

        referral.referrer_emp_id = session.user.emp_id.clone();
        self.webhook.call(&WebhookRequest::AddReferral(referral)).await?;

        self.fetcher.invalidate(&CacheKey::Referrals {
            emp_id: session.user.emp_id.clone(),
        });
        info!("Referral submitted");
        Ok(())
    }
}
