use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use sqlx_core::pool::PoolOptions;
use sqlx_sqlite::{Sqlite, SqliteConnectOptions};
use ushuffle_core::BackendKind;

use super::{Backend, ErrorClass};
use crate::DbPool;

const SQLITE_ERROR: i32 = 1;
const SQLITE_CANTOPEN: i32 = 14;

/// File-backed SQLite: `<data_dir>/sqlite_<db>/<db>`.
pub struct SqliteBackend {
    data_dir: PathBuf,
    acquire_timeout: Duration,
}

impl SqliteBackend {
    pub fn new(data_dir: PathBuf, acquire_timeout: Duration) -> Self {
        Self {
            data_dir,
            acquire_timeout,
        }
    }

    pub fn database_path(&self, database: &str) -> PathBuf {
        self.data_dir
            .join(BackendKind::Sqlite.storage_dir(database))
            .join(database)
    }

    fn options(&self, database: &str, create: bool) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(self.database_path(database))
            .create_if_missing(create)
            .busy_timeout(Duration::from_secs(5))
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn open(&self, database: &str) -> Result<DbPool, sqlx_core::Error> {
        PoolOptions::<Sqlite>::new()
            .max_connections(1)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(self.options(database, false))
            .await
            .map(DbPool::Sqlite)
    }

    async fn create_database(&self, database: &str) -> Result<(), sqlx_core::Error> {
        let pool = PoolOptions::<Sqlite>::new()
            .max_connections(1)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(self.options(database, true))
            .await?;
        pool.close().await;
        Ok(())
    }

    fn classify(&self, err: &sqlx_core::Error) -> ErrorClass {
        classify(err)
    }

    fn storage_dir(&self, database: &str) -> Option<PathBuf> {
        Some(self.data_dir.join(BackendKind::Sqlite.storage_dir(database)))
    }
}

pub(crate) fn classify(err: &sqlx_core::Error) -> ErrorClass {
    let Some(db_err) = err.as_database_error() else {
        return ErrorClass::Other;
    };
    // Extended result codes keep the primary code in the low byte.
    let primary = db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff);
    let message = db_err.message();
    match primary {
        Some(SQLITE_CANTOPEN) => ErrorClass::Missing,
        Some(SQLITE_ERROR) if message.contains("already exists") => ErrorClass::Conflict,
        Some(SQLITE_ERROR) if message.starts_with("no such table") => ErrorClass::Missing,
        _ => ErrorClass::Other,
    }
}
