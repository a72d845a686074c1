use std::collections::BTreeSet;

use async_trait::async_trait;
use ushuffle_core::{ProjId, User, TABLE_NAME};

use super::{ListScope, RepoError, UserRepository};
use crate::Database;

/// Runs each step as literal SQL statements on the shared connection.
pub struct DirectRepository<'a> {
    db: &'a Database,
}

impl<'a> DirectRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn select_sql(scope: ListScope) -> String {
        match scope {
            ListScope::All => format!("SELECT login, userid, projid FROM {}", TABLE_NAME),
            ListScope::Newest(limit) => format!(
                "SELECT login, userid, projid FROM {} ORDER BY userid DESC LIMIT {}",
                TABLE_NAME, limit
            ),
        }
    }
}

#[async_trait]
impl UserRepository for DirectRepository<'_> {
    fn strategy(&self) -> &'static str {
        "direct"
    }

    async fn insert(&mut self, users: Vec<User>) -> Result<u64, RepoError> {
        let sql = format!(
            "INSERT INTO {} (login, userid, projid) VALUES ({}, {}, {})",
            TABLE_NAME,
            self.db.param(1),
            self.db.param(2),
            self.db.param(3)
        );
        with_pool!(self.db.pool(), pool, Db => {
            let mut tx = pool.begin().await?;
            let mut inserted = 0;
            for user in &users {
                inserted += sqlx_core::query::query::<Db>(&sql)
                    .bind(user.login.as_str())
                    .bind(user.userid)
                    .bind(user.projid.get())
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            }
            tx.commit().await?;
            Ok(inserted)
        })
    }

    async fn distinct_groups(&mut self) -> Result<BTreeSet<ProjId>, RepoError> {
        let sql = format!("SELECT DISTINCT projid FROM {}", TABLE_NAME);
        let values: Vec<i32> = with_pool!(self.db.pool(), pool, Db => {
            sqlx_core::query_scalar::query_scalar::<Db, i32>(&sql)
                .fetch_all(pool)
                .await?
        });
        let groups = values
            .into_iter()
            .map(ProjId::new)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(groups)
    }

    async fn move_group(&mut self, from: ProjId, to: ProjId) -> Result<u64, RepoError> {
        let sql = format!(
            "UPDATE {} SET projid = {} WHERE projid = {}",
            TABLE_NAME,
            self.db.param(1),
            self.db.param(2)
        );
        with_pool!(self.db.pool(), pool, Db => {
            let mut tx = pool.begin().await?;
            let moved = sqlx_core::query::query::<Db>(&sql)
                .bind(to.get())
                .bind(from.get())
                .execute(&mut *tx)
                .await?
                .rows_affected();
            tx.commit().await?;
            Ok(moved)
        })
    }

    async fn remove_group(&mut self, group: ProjId) -> Result<u64, RepoError> {
        let sql = format!(
            "DELETE FROM {} WHERE projid = {}",
            TABLE_NAME,
            self.db.param(1)
        );
        with_pool!(self.db.pool(), pool, Db => {
            let mut tx = pool.begin().await?;
            let removed = sqlx_core::query::query::<Db>(&sql)
                .bind(group.get())
                .execute(&mut *tx)
                .await?
                .rows_affected();
            tx.commit().await?;
            Ok(removed)
        })
    }

    async fn list(&mut self, scope: ListScope) -> Result<Vec<User>, RepoError> {
        let sql = Self::select_sql(scope);
        let users = with_pool!(self.db.pool(), pool, Db => {
            sqlx_core::query_as::query_as::<Db, User>(&sql)
                .fetch_all(pool)
                .await?
        });
        Ok(users)
    }
}
