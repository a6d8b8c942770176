//! PostgreSQL catalog source.
//!
//! information_schema columns are domain types (`sql_identifier`,
//! `character_data`), so every column is cast to `text` before decoding.

use super::CatalogSource;
use crate::config::DatabaseConfig;
use crate::error::StartupError;
use crate::facts::PrivilegeFact;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

const TABLE_GRANTS: &str = r#"
    SELECT grantee::text, privilege_type::text, table_schema::text, table_name::text
    FROM information_schema.role_table_grants
    WHERE grantee = $1
"#;

const USAGE_GRANTS: &str = r#"
    SELECT grantee::text, privilege_type::text, object_schema::text
    FROM information_schema.usage_privileges
    WHERE grantee = $1
"#;

const DATABASE_CONNECTS: &str = r#"
    SELECT rolname::text, datname::text
    FROM pg_roles, pg_database
    WHERE rolname = $1 AND has_database_privilege(rolname, datname, 'CONNECT')
"#;

/// One long-lived connection shared by every cycle. The pool re-establishes
/// it on the next query if it drops.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Open the connection and check the server answers.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StartupError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.connect_timeout())
            .connect_with(config.connect_options())
            .await
            .map_err(StartupError::Connect)?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(StartupError::Ping)?;

        info!(host = %config.host, port = config.port, database = %config.name, "connected to PostgreSQL");
        Ok(Self { pool })
    }
}

impl CatalogSource for PgCatalog {
    async fn table_grants(&self, role: &str) -> Result<Vec<PrivilegeFact>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, String, String, String)>(TABLE_GRANTS)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(grantee, privilege, schema, table)| PrivilegeFact::table(grantee, privilege, schema, table))
            .collect())
    }

    async fn usage_grants(&self, role: &str) -> Result<Vec<PrivilegeFact>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, String, String)>(USAGE_GRANTS)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(grantee, privilege, schema)| PrivilegeFact::schema(grantee, privilege, schema))
            .collect())
    }

    async fn database_connects(&self, role: &str) -> Result<Vec<PrivilegeFact>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, String)>(DATABASE_CONNECTS)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(role, database)| PrivilegeFact::database(role, database))
            .collect())
    }
}
