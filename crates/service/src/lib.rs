//! Service infrastructure for running FDP personal storage.
//!
//! This crate provides the components a server needs around the protocol core:
//! - Database (SQLite with a NameRegistry implementation)
//! - Configuration (TOML, including the protocol parameters)
//! - State management (ServiceState wiring an Fdp client to blobs + database)
//! - Process setup (tracing subscriber)

pub mod config;
pub mod database;
pub mod process;
pub mod state;

// Re-export key types for convenience
pub use config::{Config as ServiceConfig, ConfigError};
pub use database::{Database, DatabaseSetupError};
pub use process::init_tracing;
pub use state::{ServiceFdp, State as ServiceState, StateSetupError};
