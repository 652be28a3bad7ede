//! CRM Dashboard Client
//!
//! Typed client for the CRM/HRMS webhook backend: lead management, task
//! tracking, incentive and referral reporting, with a persistent response
//! cache and shared polling.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

// Re-export commonly used items
pub use domain::{
    Comment, Fingerprint, Incentive, Lead, LeadStatus, Page, Referral, Role, Route, RowChange,
    RowDiff, Session, Task, TaskStatus, User,
};

pub use infrastructure::{
    CacheKey, CacheTtls, Clock, CrmConfig, ManualClock, ResponseCache, SystemClock, Webhook,
    WebhookClient, WebhookRequest, init_tracing,
};

pub use application::{
    AuthService, ChangeTracker, CrmError, DashboardApp, LeadService, PollEvent, PollService,
    RefreshCooldown, ReportService, Subscription, TaskService,
};

pub use utils::ShutdownManager;
