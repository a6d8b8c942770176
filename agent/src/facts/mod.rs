//! Privilege facts and their canonical keys.
//!
//! A fact is one privilege the monitored role holds. Facts are compared by
//! key: the kind tag followed by the kind's fields, joined with `:`. Fields are
//! escaped (`\` → `\\`, `:` → `\:`) so identifiers containing the separator
//! cannot make two facts collide.

mod key;
mod snapshot;

pub use key::{KeyParseError, PrivilegeKey};
pub use snapshot::Snapshot;

use std::fmt;

/// Privilege domain a fact was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactKind {
    Table,
    Schema,
    Database,
}

impl FactKind {
    pub fn tag(self) -> &'static str {
        match self {
            FactKind::Table => "TABLE",
            FactKind::Schema => "SCHEMA",
            FactKind::Database => "DATABASE",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "TABLE" => Some(FactKind::Table),
            "SCHEMA" => Some(FactKind::Schema),
            "DATABASE" => Some(FactKind::Database),
            _ => None,
        }
    }
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single privilege held by a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrivilegeFact {
    /// Row from `information_schema.role_table_grants`.
    Table {
        grantee: String,
        privilege_type: String,
        schema: String,
        table: String,
    },
    /// Row from `information_schema.usage_privileges`.
    Schema {
        grantee: String,
        privilege_type: String,
        schema: String,
    },
    /// CONNECT on a database, as reported by `has_database_privilege`.
    Database { role: String, database: String },
}

/// Privilege name stored in DATABASE keys.
pub const CONNECT: &str = "CONNECT";

impl PrivilegeFact {
    pub fn table(
        grantee: impl Into<String>,
        privilege_type: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        PrivilegeFact::Table {
            grantee: grantee.into(),
            privilege_type: privilege_type.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn schema(
        grantee: impl Into<String>,
        privilege_type: impl Into<String>,
        schema: impl Into<String>,
    ) -> Self {
        PrivilegeFact::Schema {
            grantee: grantee.into(),
            privilege_type: privilege_type.into(),
            schema: schema.into(),
        }
    }

    pub fn database(role: impl Into<String>, database: impl Into<String>) -> Self {
        PrivilegeFact::Database {
            role: role.into(),
            database: database.into(),
        }
    }

    pub fn kind(&self) -> FactKind {
        match self {
            PrivilegeFact::Table { .. } => FactKind::Table,
            PrivilegeFact::Schema { .. } => FactKind::Schema,
            PrivilegeFact::Database { .. } => FactKind::Database,
        }
    }

    /// Key fields after the kind tag, in key order.
    fn fields(&self) -> Vec<&str> {
        match self {
            PrivilegeFact::Table {
                grantee,
                privilege_type,
                schema,
                table,
            } => vec![grantee.as_str(), privilege_type.as_str(), schema.as_str(), table.as_str()],
            PrivilegeFact::Schema {
                grantee,
                privilege_type,
                schema,
            } => vec![grantee.as_str(), privilege_type.as_str(), schema.as_str()],
            PrivilegeFact::Database { role, database } => vec![role.as_str(), CONNECT, database.as_str()],
        }
    }

    /// Canonical key for set membership.
    pub fn key(&self) -> PrivilegeKey {
        PrivilegeKey::encode(self.kind(), &self.fields())
    }
}
