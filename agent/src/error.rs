//! Error types for the agent.
//!
//! Collection and store errors are cycle-local: the monitor logs them and
//! carries on. [`ConfigError`] and [`StartupError`] end the process.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Catalog queried by one of the three collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeDomain {
    Table,
    Schema,
    Database,
}

impl fmt::Display for PrivilegeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrivilegeDomain::Table => "table",
            PrivilegeDomain::Schema => "schema",
            PrivilegeDomain::Database => "database",
        })
    }
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{domain} privilege query failed: {source}")]
    Query {
        domain: PrivilegeDomain,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not decode {domain} privilege row: {source}")]
    Decode {
        domain: PrivilegeDomain,
        #[source]
        source: sqlx::Error,
    },

    #[error("collection did not finish within {secs}s")]
    Timeout { secs: u64 },
}

impl CollectError {
    /// Classify a driver error raised while running the query for `domain`.
    pub fn from_sqlx(domain: PrivilegeDomain, source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. } => CollectError::Decode { domain, source },
            source => CollectError::Query { domain, source },
        }
    }

    pub fn domain(&self) -> Option<PrivilegeDomain> {
        match self {
            CollectError::Query { domain, .. } | CollectError::Decode { domain, .. } => Some(*domain),
            CollectError::Timeout { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read state file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse state file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write state file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database did not answer reachability check: {0}")]
    Ping(#[source] sqlx::Error),
}
