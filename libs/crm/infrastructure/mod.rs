//! Infrastructure Layer
//!
//! Contains implementations of external interfaces (webhook client,
//! persistent cache, configuration, logging).
//! This layer depends on the domain layer but not on the application layer.

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod logging;

// Re-export commonly used types from client
pub use client::{
    AuthResponse, Endpoint, Webhook, WebhookClient, WebhookEndpoints, WebhookError,
    WebhookRequest,
};

// Re-export cache types
pub use cache::{
    CacheEntry, CacheError, CacheKey, CacheSnapshot, CacheStats, CacheTtls, ResponseCache,
};
pub use clock::{Clock, ManualClock, SystemClock};

// Re-export config types
pub use config::{ConfigError, Credentials, CrmConfig};

pub use logging::init_tracing;
