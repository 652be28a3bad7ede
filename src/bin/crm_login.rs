//! One-shot login check: signs in, prints the landing route and a short
//! summary of what the account can see.

use anyhow::Result;
use crm_dashboard::bin_common::{load_config_from_env, parse_args, CliArgs, ConfigType};
use crm_dashboard::crm::application::DashboardApp;
use crm_dashboard::crm::infrastructure::{init_tracing, Credentials, CrmConfig};
use crm_dashboard::crm::Route;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = load_config_from_env(ConfigType::Crm);
    let config = CrmConfig::load(&config_path)?;
    init_tracing(&config.log_level);

    let args = CliArgs::parse(&parse_args());
    let app = DashboardApp::new(config)?;

    if args.logout {
        app.logout();
        info!("Session and cache cleared");
        return Ok(());
    }

    let credentials = Credentials::from_env()?;
    let session = if args.force {
        app.auth.login(&credentials.email, &credentials.password).await?
    } else {
        app.restore_or_login(Some(&credentials)).await?
    };

    let route = app.auth.route(Route::Login);
    info!("User: {} <{}> ({:?})", session.user.name, session.user.email, session.user.role);
    info!("Landing route: {}", route.path());

    let leads = app.leads.list(args.force).await?;
    let tasks = app.tasks.all(args.force).await?;
    let open_tasks = tasks.iter().filter(|t| t.status.is_open()).count();
    info!("Leads: {} | Tasks: {} ({} open)", leads.len(), tasks.len(), open_tasks);

    let incentives = app.reports.incentives(args.force).await?;
    let total: f64 = incentives.iter().map(|i| i.amount).sum();
    info!("Incentive rows: {} | Total amount: {:.2}", incentives.len(), total);

    let stats = app.cache_stats();
    info!("Cache: {} entries ({} fresh, {} stale)", stats.total, stats.fresh, stats.stale);
    Ok(())
}
