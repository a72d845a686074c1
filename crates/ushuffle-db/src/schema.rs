use std::time::Duration;

use async_trait::async_trait;
use ushuffle_core::{schema_defaults, NAME_MAX_LEN, TABLE_NAME};

use crate::backend::ErrorClass;
use crate::Database;

/// The fixed `users` table. Only the key constraint differs between the
/// direct and the session strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub userid_primary_key: bool,
}

impl TableSpec {
    pub const PLAIN: Self = Self {
        userid_primary_key: false,
    };
    pub const MAPPED: Self = Self {
        userid_primary_key: true,
    };

    pub fn create_sql(&self) -> String {
        let key = if self.userid_primary_key {
            " PRIMARY KEY"
        } else {
            ""
        };
        format!(
            "CREATE TABLE {} (login VARCHAR({}), userid INTEGER{}, projid INTEGER)",
            TABLE_NAME, NAME_MAX_LEN, key
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropMode {
    /// Plain `DROP TABLE`; fails when the table is absent.
    Strict,
    IfExists,
}

impl DropMode {
    pub fn sql(self) -> String {
        match self {
            Self::Strict => format!("DROP TABLE {}", TABLE_NAME),
            Self::IfExists => format!("DROP TABLE IF EXISTS {}", TABLE_NAME),
        }
    }
}

#[async_trait]
pub trait TableDdl: Send + Sync {
    async fn create_table(&self, spec: &TableSpec) -> Result<(), sqlx_core::Error>;
    async fn drop_table(&self, mode: DropMode) -> Result<(), sqlx_core::Error>;
    fn classify(&self, err: &sqlx_core::Error) -> ErrorClass;
}

#[async_trait]
impl TableDdl for Database {
    async fn create_table(&self, spec: &TableSpec) -> Result<(), sqlx_core::Error> {
        let sql = spec.create_sql();
        with_pool!(self.pool(), pool, Db => {
            sqlx_core::query::query::<Db>(&sql)
                .execute(pool)
                .await
                .map(|_| ())
        })
    }

    async fn drop_table(&self, mode: DropMode) -> Result<(), sqlx_core::Error> {
        let sql = mode.sql();
        with_pool!(self.pool(), pool, Db => {
            sqlx_core::query::query::<Db>(&sql)
                .execute(pool)
                .await
                .map(|_| ())
        })
    }

    fn classify(&self, err: &sqlx_core::Error) -> ErrorClass {
        Database::classify(self, err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    Created { attempts: u32 },
    /// Every attempt hit a conflict. The run goes on against whatever table
    /// is there.
    Exhausted { attempts: u32 },
}

impl SchemaOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Created { attempts } | Self::Exhausted { attempts } => *attempts,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchemaManager {
    retries: u32,
    cooldown: Duration,
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new(
            schema_defaults::RETRIES,
            Duration::from_secs(schema_defaults::COOLDOWN_SECONDS),
        )
    }
}

impl SchemaManager {
    pub fn new(retries: u32, cooldown: Duration) -> Self {
        Self { retries, cooldown }
    }

    /// Creates the table. A conflicting table is dropped and creation retried
    /// after the cooldown, at most `retries` times. Errors that are not
    /// conflicts are returned unchanged.
    pub async fn create_table<D>(
        &self,
        ddl: &D,
        spec: &TableSpec,
    ) -> Result<SchemaOutcome, sqlx_core::Error>
    where
        D: TableDdl + ?Sized,
    {
        let mut remaining = self.retries;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match ddl.create_table(spec).await {
                Ok(()) => {
                    tracing::info!(event = "schema_created", attempts);
                    return Ok(SchemaOutcome::Created { attempts });
                }
                Err(err) => err,
            };
            if ddl.classify(&err) != ErrorClass::Conflict {
                return Err(err);
            }
            if remaining == 0 {
                tracing::warn!(event = "schema_exhausted", attempts, error = %err);
                return Ok(SchemaOutcome::Exhausted { attempts });
            }
            tracing::warn!(
                event = "schema_conflict",
                attempts,
                remaining,
                error = %err,
                "dropping table before retry"
            );
            if let Err(drop_err) = ddl.drop_table(DropMode::Strict).await {
                if ddl.classify(&drop_err) != ErrorClass::Missing {
                    return Err(drop_err);
                }
                tracing::debug!(event = "schema_drop_absent", error = %drop_err);
            }
            remaining -= 1;
            tokio::time::sleep(self.cooldown).await;
        }
    }
}
