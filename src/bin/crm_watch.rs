use anyhow::Result;
use crm_dashboard::bin_common::{
    load_config_from_env, parse_args, BinaryRunner, CliArgs, ConfigType, RunConfig,
};
use crm_dashboard::crm::application::{CrmError, DashboardApp, PollEvent, Subscription};
use crm_dashboard::crm::infrastructure::{init_tracing, Credentials, CrmConfig};
use crm_dashboard::crm::RowChange;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Default)]
struct WatchStats {
    ticks: u64,
    failures: u64,
    highlighted: u64,
}

struct WatchRunner {
    app: DashboardApp,
    args: CliArgs,
    run_config: RunConfig,
    stats: WatchStats,
}

impl BinaryRunner for WatchRunner {
    async fn run(&mut self) -> Result<()> {
        if self.args.logout {
            self.app.logout();
        }

        let credentials = Credentials::from_env().ok();
        let session = self.app.restore_or_login(credentials.as_ref()).await?;
        info!(
            "Signed in as {} ({}), landing on {}",
            session.user.name,
            session.user.emp_id,
            session.landing_route().path()
        );

        if self.args.force {
            match self.app.leads.refresh().await {
                Ok(leads) => info!("Manual refresh loaded {} leads", leads.len()),
                Err(CrmError::CooldownActive(secs)) => {
                    warn!("Refresh on cooldown for {}s, using cached data", secs)
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut leads = self.app.watch_leads();
        let mut tasks = (!self.args.leads_only).then(|| self.app.watch_tasks());

        let shutdown = self.app.shutdown.clone();
        let mut status = tokio::time::interval(Duration::from_secs(
            self.run_config.status_interval_secs,
        ));
        status.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                event = leads.next() => match event {
                    Some(event) => report("leads", event, &mut self.stats),
                    None => break,
                },
                Some(event) = next_event(&mut tasks) => report("tasks", event, &mut self.stats),
                _ = status.tick() => {
                    let cache = self.app.cache_stats();
                    info!(
                        "Status: {} ticks, {} failures, cache {} entries ({} fresh)",
                        self.stats.ticks, self.stats.failures, cache.total, cache.fresh
                    );
                }
            }
        }

        self.app.poller.shutdown();
        if let Err(e) = self.app.purge_cache() {
            error!("Failed to purge cache on exit: {}", e);
        }
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        Some(format!(
            "Ticks: {} | Failures: {} | Highlighted rows: {}",
            self.stats.ticks, self.stats.failures, self.stats.highlighted
        ))
    }
}

async fn next_event<T>(sub: &mut Option<Subscription<T>>) -> Option<PollEvent<T>> {
    match sub {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

fn report<T>(name: &str, event: PollEvent<T>, stats: &mut WatchStats) {
    stats.ticks += 1;
    match event {
        PollEvent::Updated { rows, diff, .. } => {
            for (id, change) in &diff.changes {
                match change {
                    RowChange::New => info!("[{}] new: {}", name, id),
                    RowChange::Modified => info!("[{}] modified: {}", name, id),
                    RowChange::Unchanged => continue,
                }
                stats.highlighted += 1;
            }
            for id in &diff.removed {
                info!("[{}] removed: {}", name, id);
            }
            if !diff.has_changes() {
                tracing::debug!("[{}] {} rows, no changes", name, rows.len());
            }
        }
        PollEvent::Failed { message } => {
            stats.failures += 1;
            warn!("[{}] poll failed: {}", name, message);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Crm);
    let config = CrmConfig::load(&config_path)?;

    init_tracing(&config.log_level);
    config.log();

    let args = CliArgs::parse(&parse_args());
    let app = DashboardApp::new(config)?;

    let mut runner = WatchRunner {
        app,
        args,
        run_config: RunConfig::new("CRM Watch").with_status_interval(300),
        stats: WatchStats::default(),
    };
    runner.execute().await
}
