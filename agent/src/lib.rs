//! privwatch agent: watches one PostgreSQL role's privileges and reports
//! grants and revocations between polls.
//!
//! Modular structure:
//! - [`facts`] — Privilege facts, canonical keys, snapshots
//! - [`collectors`] — Catalog queries that build the current snapshot
//! - [`diff`] — Added/removed classification between snapshots
//! - [`storage`] — Persisted last-known snapshot
//! - [`monitor`] — Collect → diff → persist cycle and polling loop
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod facts;
pub mod collectors;
pub mod diff;
pub mod storage;
pub mod monitor;
pub mod logging;

pub use config::AgentConfig;
pub use error::{CollectError, ConfigError, StartupError, StoreError};
pub use facts::{PrivilegeFact, PrivilegeKey, Snapshot};
pub use collectors::{CatalogSource, PgCatalog, PrivilegeCollector};
pub use diff::{Delta, DiffEngine};
pub use storage::StateFile;
pub use monitor::{CycleOutcome, Monitor};
pub use logging::StructuredLogger;
