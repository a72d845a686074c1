use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx_core::pool::PoolOptions;
use sqlx_mysql::{MySql, MySqlConnectOptions, MySqlDatabaseError};
use ushuffle_core::BackendKind;

use super::{Backend, ErrorClass};
use crate::DbPool;

const ER_BAD_DB_ERROR: u16 = 1049;
const ER_TABLE_EXISTS_ERROR: u16 = 1050;
const ER_BAD_TABLE_ERROR: u16 = 1051;
const ER_NO_SUCH_TABLE: u16 = 1146;

/// MySQL server reached through `server_url`, which names no database.
pub struct MySqlBackend {
    server_url: String,
    acquire_timeout: Duration,
}

impl MySqlBackend {
    pub fn new(server_url: String, acquire_timeout: Duration) -> Self {
        Self {
            server_url,
            acquire_timeout,
        }
    }

    fn server_options(&self) -> Result<MySqlConnectOptions, sqlx_core::Error> {
        MySqlConnectOptions::from_str(&self.server_url)
    }

    fn pool_options(&self) -> PoolOptions<MySql> {
        PoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.acquire_timeout)
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MySql
    }

    async fn open(&self, database: &str) -> Result<DbPool, sqlx_core::Error> {
        let options = self.server_options()?.database(database);
        self.pool_options()
            .connect_with(options)
            .await
            .map(DbPool::MySql)
    }

    async fn create_database(&self, database: &str) -> Result<(), sqlx_core::Error> {
        let pool = self
            .pool_options()
            .connect_with(self.server_options()?)
            .await?;
        let sql = format!("CREATE DATABASE {}", database);
        let result = sqlx_core::query::query::<MySql>(&sql)
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
    let number = err
        .as_database_error()
        .and_then(|db_err| db_err.try_downcast_ref::<MySqlDatabaseError>())
        .map(MySqlDatabaseError::number);
    match number {
        Some(ER_BAD_DB_ERROR | ER_BAD_TABLE_ERROR | ER_NO_SUCH_TABLE) => ErrorClass::Missing,
        Some(ER_TABLE_EXISTS_ERROR) => ErrorClass::Conflict,
        _ => ErrorClass::Other,
    }
}
