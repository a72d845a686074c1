use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgConnectOptions, Postgres};
use ushuffle_core::BackendKind;

use super::{Backend, ErrorClass};
use crate::DbPool;

const INVALID_CATALOG_NAME: &str = "3D000";
const UNDEFINED_TABLE: &str = "42P01";
const DUPLICATE_TABLE: &str = "42P07";

/// Database used for the privileged connection that provisions new ones.
const MAINTENANCE_DB: &str = "postgres";

pub struct PgBackend {
    server_url: String,
    acquire_timeout: Duration,
}

impl PgBackend {
    pub fn new(server_url: String, acquire_timeout: Duration) -> Self {
        Self {
            server_url,
            acquire_timeout,
        }
    }

    fn server_options(&self) -> Result<PgConnectOptions, sqlx_core::Error> {
        PgConnectOptions::from_str(&self.server_url)
    }

    fn pool_options(&self) -> PoolOptions<Postgres> {
        PoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.acquire_timeout)
    }
}

#[async_trait]
impl Backend for PgBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn open(&self, database: &str) -> Result<DbPool, sqlx_core::Error> {
        let options = self.server_options()?.database(database);
        self.pool_options()
            .connect_with(options)
            .await
            .map(DbPool::Postgres)
    }

    async fn create_database(&self, database: &str) -> Result<(), sqlx_core::Error> {
        let options = self.server_options()?.database(MAINTENANCE_DB);
        let pool = self.pool_options().connect_with(options).await?;
        let sql = format!("CREATE DATABASE \"{}\"", database);
        let result = sqlx_core::query::query::<Postgres>(&sql)
            .execute(&pool)
            .await
            .map(|_| ());
        pool.close().await;
        result
    }

    fn classify(&self, err: &sqlx_core::Error) -> ErrorClass {
        classify(err)
    }
}

pub(crate) fn classify(err: &sqlx_core::Error) -> ErrorClass {
    let code = err.as_database_error().and_then(|db_err| db_err.code());
    match code.as_deref() {
        Some(INVALID_CATALOG_NAME | UNDEFINED_TABLE) => ErrorClass::Missing,
        Some(DUPLICATE_TABLE) => ErrorClass::Conflict,
        _ => ErrorClass::Other,
    }
}
