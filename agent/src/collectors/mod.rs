//! Privilege collection: reads the monitored role's grants from the catalogs
//! and assembles a [`Snapshot`].
//!
//! The catalog is behind [`CatalogSource`] so the collector can be driven by
//! something other than a live PostgreSQL connection.

mod postgres;

pub use postgres::PgCatalog;

use crate::error::{CollectError, PrivilegeDomain};
use crate::facts::{PrivilegeFact, Snapshot};
use std::future::Future;
use tracing::debug;

/// Read-only access to the three privilege catalogs.
pub trait CatalogSource {
    /// Table-level grants held by `role`.
    fn table_grants(&self, role: &str) -> impl Future<Output = Result<Vec<PrivilegeFact>, sqlx::Error>> + Send;

    /// Usage grants on schema objects held by `role`.
    fn usage_grants(&self, role: &str) -> impl Future<Output = Result<Vec<PrivilegeFact>, sqlx::Error>> + Send;

    /// Databases `role` may CONNECT to.
    fn database_connects(&self, role: &str) -> impl Future<Output = Result<Vec<PrivilegeFact>, sqlx::Error>> + Send;
}

pub struct PrivilegeCollector<S> {
    source: S,
}

impl<S: CatalogSource> PrivilegeCollector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Collect the current snapshot for `role`. Any failing query aborts the
    /// whole collection; a partial snapshot is never returned.
    pub async fn collect(&self, role: &str) -> Result<Snapshot, CollectError> {
        let mut snapshot = Snapshot::new();

        let tables = self
            .source
            .table_grants(role)
            .await
            .map_err(|e| CollectError::from_sqlx(PrivilegeDomain::Table, e))?;
        let schemas = self
            .source
            .usage_grants(role)
            .await
            .map_err(|e| CollectError::from_sqlx(PrivilegeDomain::Schema, e))?;
        let databases = self
            .source
            .database_connects(role)
            .await
            .map_err(|e| CollectError::from_sqlx(PrivilegeDomain::Database, e))?;

        debug!(
            tables = tables.len(),
            schemas = schemas.len(),
            databases = databases.len(),
            "catalog rows fetched"
        );

        for fact in tables.iter().chain(&schemas).chain(&databases) {
            snapshot.insert_fact(fact);
        }
        Ok(snapshot)
    }
}
