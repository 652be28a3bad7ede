//! CRM Dashboard Client - Main Library
//!
//! Thin root crate for the CRM dashboard binaries, following Clean
//! Architecture principles.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **crm**: Core business logic (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use crm_dashboard::bin_common::{load_config_from_env, ConfigType};
//! use crm_dashboard::crm::application::DashboardApp;
//! ```

// Re-export workspace library for convenience
pub use crm;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables
    //!
    //! Provides shared functionality for the presentation layer (binaries)
    //! following Clean Architecture principles.

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, CliArgs, ConfigType};
    pub use runner::{BinaryRunner, RunConfig};
}
