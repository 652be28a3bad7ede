//! Application Facade
//!
//! Public API for binaries (presentation layer).
//! Wires the webhook client, response cache and poll service into the
//! auth, lead, task and report use cases.

use super::{
    AuthService, CachedFetcher, LeadService, PollService, RefreshCooldown, ReportService,
    Subscription, TaskService,
};
use crate::domain::models::{Lead, Task};
use crate::domain::session::Session;
use crate::infrastructure::{
    CacheStats, Clock, Credentials, CrmConfig, ResponseCache, SystemClock, Webhook, WebhookClient,
};
use crate::utils::ShutdownManager;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const LEADS_SUBSCRIPTION: &str = "leads";
pub const TASKS_SUBSCRIPTION: &str = "tasks";

/// Application facade for the CRM dashboard
pub struct DashboardApp {
    pub config: CrmConfig,
    pub auth: Arc<AuthService>,
    pub leads: LeadService,
    pub tasks: TaskService,
    pub reports: ReportService,
    pub poller: PollService,
    pub shutdown: ShutdownManager,
    fetcher: CachedFetcher,
}

impl DashboardApp {
    /// Initialize against the configured webhook backend
    ///
    /// An unreadable cache file is logged and replaced by an empty cache.
    pub fn new(config: CrmConfig) -> anyhow::Result<Self> {
        let webhook = WebhookClient::new(config.webhook.endpoints(), config.webhook.timeout())?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let cache = match ResponseCache::load(&config.cache.path, Arc::clone(&clock)) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(
                    "Cache file {} unusable ({}), starting with an empty cache",
                    config.cache.path.display(),
                    e
                );
                ResponseCache::empty_at(&config.cache.path, Arc::clone(&clock))
            }
        };

        let app = Self::with_parts(config, Arc::new(webhook), cache, clock);
        app.shutdown.spawn_signal_handler();
        Ok(app)
    }

    /// Assemble from explicit parts; used by tests with a fake webhook
    pub fn with_parts(
        config: CrmConfig,
        webhook: Arc<dyn Webhook>,
        cache: ResponseCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fetcher = CachedFetcher::new(Arc::new(Mutex::new(cache)), config.cache.ttls.clone());
        let auth = Arc::new(AuthService::new(Arc::clone(&webhook), fetcher.clone()));

        let cooldown = RefreshCooldown::new(config.polling.refresh_cooldown());
        let leads = LeadService::new(
            Arc::clone(&webhook),
            fetcher.clone(),
            Arc::clone(&auth),
            Arc::new(Mutex::new(cooldown)),
        );
        let tasks = TaskService::new(Arc::clone(&webhook), fetcher.clone(), Arc::clone(&auth));
        let reports = ReportService::new(webhook, fetcher.clone(), Arc::clone(&auth));

        let poller = PollService::new(clock, config.polling.highlight());

        Self {
            config,
            auth,
            leads,
            tasks,
            reports,
            poller,
            shutdown: ShutdownManager::new(),
            fetcher,
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Reuse a persisted session, logging in with `credentials` otherwise
    pub async fn restore_or_login(&self, credentials: Option<&Credentials>) -> anyhow::Result<Session> {
        if let Some(session) = self.auth.restore() {
            return Ok(session);
        }

        let credentials = credentials
            .ok_or_else(|| anyhow::anyhow!("No saved session and no credentials supplied"))?;
        Ok(self.auth.login(&credentials.email, &credentials.password).await?)
    }

    /// Stop polling, forget the session and wipe the cache
    pub fn logout(&self) {
        self.poller.shutdown();
        self.auth.logout();
    }

    /// Poll the lead list at the configured interval
    pub fn watch_leads(&self) -> Subscription<Lead> {
        let leads = self.leads.clone();
        self.poller.subscribe(
            LEADS_SUBSCRIPTION,
            Duration::from_secs(self.config.polling.leads_interval_secs),
            move || {
                let leads = leads.clone();
                async move { leads.list(true).await }
            },
        )
    }

    /// Poll the task list at the configured interval
    pub fn watch_tasks(&self) -> Subscription<Task> {
        let tasks = self.tasks.clone();
        self.poller.subscribe(
            TASKS_SUBSCRIPTION,
            Duration::from_secs(self.config.polling.tasks_interval_secs),
            move || {
                let tasks = tasks.clone();
                async move { tasks.all(true).await }
            },
        )
    }

    pub fn set_poll_interval(&self, name: &str, interval: Duration) -> bool {
        self.poller.set_interval(name, interval)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.fetcher.cache().lock().stats(&self.config.cache.ttls)
    }

    /// Drop expired entries and persist
    pub fn purge_cache(&self) -> anyhow::Result<usize> {
        let removed = self
            .fetcher
            .cache()
            .lock()
            .purge_expired(&self.config.cache.ttls);
        self.fetcher.persist()?;
        if removed > 0 {
            info!("Purged {} expired cache entries", removed);
        }
        Ok(removed)
    }
}
