#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_raw_string_hashes)]
#![allow(clippy::uninlined_format_args)]

#[cfg(not(any(feature = "mysql", feature = "postgres", feature = "sqlite")))]
compile_error!("enable at least one backend feature: sqlite, mysql or postgres");

use sqlx_core::pool::Pool;
#[cfg(feature = "mysql")]
use sqlx_mysql::MySql;
#[cfg(feature = "postgres")]
use sqlx_postgres::Postgres;
#[cfg(feature = "sqlite")]
use sqlx_sqlite::Sqlite;
use ushuffle_core::BackendKind;

#[cfg(feature = "sqlite")]
pub type SqlitePool = Pool<Sqlite>;
#[cfg(feature = "mysql")]
pub type MySqlPool = Pool<MySql>;
#[cfg(feature = "postgres")]
pub type PgPool = Pool<Postgres>;

/// Runs `$body` against whichever pool is live, with `$db` aliased to the
/// matching sqlx database type.
macro_rules! with_pool {
    ($pool:expr, $p:ident, $db:ident => $body:block) => {
        match $pool {
            #[cfg(feature = "sqlite")]
            $crate::DbPool::Sqlite($p) => {
                #[allow(dead_code)]
                type $db = sqlx_sqlite::Sqlite;
                $body
            }
            #[cfg(feature = "mysql")]
            $crate::DbPool::MySql($p) => {
                #[allow(dead_code)]
                type $db = sqlx_mysql::MySql;
                $body
            }
            #[cfg(feature = "postgres")]
            $crate::DbPool::Postgres($p) => {
                #[allow(dead_code)]
                type $db = sqlx_postgres::Postgres;
                $body
            }
        }
    };
}

pub mod backend;
pub mod negotiate;
pub mod repo;
pub mod schema;

pub use backend::{Backend, BackendOptions, BackendRegistry, ErrorClass};
pub use negotiate::{Negotiator, Unavailable, UnavailableReason};
pub use repo::{
    insert_seeds, remove_random_group, shuffle_group, DirectRepository, EntityState, FlushStats,
    ListScope, RepoError, Session, SessionError, SessionRepository, UserRepository,
};
pub use schema::{DropMode, SchemaManager, SchemaOutcome, TableDdl, TableSpec};

pub enum DbPool {
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
    #[cfg(feature = "mysql")]
    MySql(MySqlPool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

/// An open connection to one backend, together with the error classifier
/// that understands that backend's failures.
pub struct Database {
    backend: BackendKind,
    pool: DbPool,
}

impl Database {
    pub fn new(backend: BackendKind, pool: DbPool) -> Self {
        Self { backend, pool }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn classify(&self, err: &sqlx_core::Error) -> ErrorClass {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(_) => backend::sqlite::classify(err),
            #[cfg(feature = "mysql")]
            DbPool::MySql(_) => backend::mysql::classify(err),
            #[cfg(feature = "postgres")]
            DbPool::Postgres(_) => backend::postgres::classify(err),
        }
    }

    /// Bind placeholder for the `index`-th parameter (1-based).
    pub(crate) fn param(&self, index: usize) -> String {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(_) => format!("?{}", index),
            #[cfg(feature = "mysql")]
            DbPool::MySql(_) => "?".to_string(),
            #[cfg(feature = "postgres")]
            DbPool::Postgres(_) => format!("${}", index),
        }
    }

    pub async fn close(self) {
        with_pool!(&self.pool, pool, _Db => {
            pool.close().await;
        });
        tracing::debug!(event = "db_closed", backend = %self.backend);
    }
}
