//! Application Layer
//!
//! Use cases built on the domain and infrastructure layers: session
//! handling, cached lead/task/report access, change highlighting and
//! shared polling.

pub mod auth;
pub mod cached_fetch;
pub mod cooldown;
pub mod error;
pub mod facade;
pub mod highlighter;
pub mod leads;
pub mod poller;
pub mod reports;
pub mod tasks;

pub use auth::AuthService;
pub use cached_fetch::{CachedFetcher, SharedCache};
pub use cooldown::RefreshCooldown;
pub use error::{AuthError, CrmError};
pub use facade::{DashboardApp, LEADS_SUBSCRIPTION, TASKS_SUBSCRIPTION};
pub use highlighter::{ChangeTracker, Highlight};
pub use leads::LeadService;
pub use poller::{PollEvent, PollService, Subscription};
pub use reports::ReportService;
pub use tasks::TaskService;
