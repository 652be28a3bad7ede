//! Domain Layer
//!
//! Contains pure business entities and domain models.
//! This layer has no dependencies on infrastructure or application layers.

pub mod fingerprint;
pub mod models;
pub mod query;
pub mod session;
pub mod validation;

// Re-export domain models
pub use models::{
    Comment, Incentive, Lead, LeadStatus, Referral, Role, Task, TaskStatus, User,
};

// Re-export change detection
pub use fingerprint::{diff_rows, fingerprint_map, Fingerprint, FingerprintMap, RowChange, RowDiff};

// Re-export list helpers
pub use query::{LeadQuery, Page, SortField, SortOrder, TaskQuery};

// Re-export session entities
pub use session::{landing_route, Route, Session};

// Re-export validation
pub use validation::ValidationError;
