use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use ushuffle_core::{ProjId, User, TABLE_NAME};

use super::{ListScope, RepoError, UserRepository};
use crate::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Added in memory, not yet written.
    Pending,
    /// Matches the last row loaded or flushed.
    Persistent,
    Dirty,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("userid {0} is already tracked by this session")]
    DuplicateIdentity(i32),
    #[error("userid {0} is not tracked by this session")]
    NotTracked(i32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy)]
enum Filter {
    All,
    Group(ProjId),
    Newest(u32),
}

#[derive(Debug)]
struct Tracked {
    user: User,
    state: EntityState,
}

/// Unit of work over the `users` table. Records are tracked by `userid` in an
/// identity map; changes stay in memory until [`Session::commit`].
pub struct Session<'a> {
    db: &'a Database,
    identity: BTreeMap<i32, Tracked>,
}

impl<'a> Session<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            identity: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, user: User) -> Result<(), SessionError> {
        if self.identity.contains_key(&user.userid) {
            return Err(SessionError::DuplicateIdentity(user.userid));
        }
        self.identity.insert(
            user.userid,
            Tracked {
                user,
                state: EntityState::Pending,
            },
        );
        Ok(())
    }

    pub fn add_all(&mut self, users: impl IntoIterator<Item = User>) -> Result<(), SessionError> {
        users.into_iter().try_for_each(|user| self.add(user))
    }

    /// Tracked record, unless it is marked for deletion.
    pub fn get(&self, userid: i32) -> Option<&User> {
        self.identity
            .get(&userid)
            .filter(|tracked| tracked.state != EntityState::Deleted)
            .map(|tracked| &tracked.user)
    }

    pub fn state(&self, userid: i32) -> Option<EntityState> {
        self.identity.get(&userid).map(|tracked| tracked.state)
    }

    pub fn set_group(&mut self, userid: i32, group: ProjId) -> Result<(), SessionError> {
        let tracked = self
            .identity
            .get_mut(&userid)
            .filter(|tracked| tracked.state != EntityState::Deleted)
            .ok_or(SessionError::NotTracked(userid))?;
        if tracked.user.projid == group {
            return Ok(());
        }
        tracked.user.projid = group;
        if tracked.state == EntityState::Persistent {
            tracked.state = EntityState::Dirty;
        }
        Ok(())
    }

    pub fn delete(&mut self, userid: i32) -> Result<(), SessionError> {
        let state = self.state(userid).ok_or(SessionError::NotTracked(userid))?;
        match state {
            // Never written, so there is nothing to delete in the table.
            EntityState::Pending => {
                self.identity.remove(&userid);
            }
            EntityState::Persistent | EntityState::Dirty | EntityState::Deleted => {
                if let Some(tracked) = self.identity.get_mut(&userid) {
                    tracked.state = EntityState::Deleted;
                }
            }
        }
        Ok(())
    }

    pub fn has_pending_changes(&self) -> bool {
        self.identity
            .values()
            .any(|tracked| tracked.state != EntityState::Persistent)
    }

    /// Writes every pending insert, update and delete in one transaction.
    /// On failure the transaction rolls back and the in-memory states are kept.
    pub async fn commit(&mut self) -> Result<FlushStats, RepoError> {
        if !self.has_pending_changes() {
            return Ok(FlushStats::default());
        }
        let db = self.db;
        let insert_sql = format!(
            "INSERT INTO {} (login, userid, projid) VALUES ({}, {}, {})",
            TABLE_NAME,
            db.param(1),
            db.param(2),
            db.param(3)
        );
        let update_sql = format!(
            "UPDATE {} SET login = {}, projid = {} WHERE userid = {}",
            TABLE_NAME,
            db.param(1),
            db.param(2),
            db.param(3)
        );
        let delete_sql = format!("DELETE FROM {} WHERE userid = {}", TABLE_NAME, db.param(1));

        let mut stats = FlushStats::default();
        with_pool!(db.pool(), pool, Db => {
            let mut tx = pool.begin().await?;
            for tracked in self.identity.values() {
                let user = &tracked.user;
                match tracked.state {
                    EntityState::Persistent => {}
                    EntityState::Pending => {
                        stats.inserted += sqlx_core::query::query::<Db>(&insert_sql)
                            .bind(user.login.as_str())
                            .bind(user.userid)
                            .bind(user.projid.get())
                            .execute(&mut *tx)
                            .await?
                            .rows_affected();
                    }
                    EntityState::Dirty => {
                        stats.updated += sqlx_core::query::query::<Db>(&update_sql)
                            .bind(user.login.as_str())
                            .bind(user.projid.get())
                            .bind(user.userid)
                            .execute(&mut *tx)
                            .await?
                            .rows_affected();
                    }
                    EntityState::Deleted => {
                        stats.deleted += sqlx_core::query::query::<Db>(&delete_sql)
                            .bind(user.userid)
                            .execute(&mut *tx)
                            .await?
                            .rows_affected();
                    }
                }
            }
            tx.commit().await?;
        });

        self.identity
            .retain(|_, tracked| tracked.state != EntityState::Deleted);
        for tracked in self.identity.values_mut() {
            tracked.state = EntityState::Persistent;
        }
        tracing::debug!(
            event = "session_flush",
            inserted = stats.inserted,
            updated = stats.updated,
            deleted = stats.deleted
        );
        Ok(stats)
    }

    /// Flushes pending work, loads matching rows and merges them into the
    /// identity map. Clean records are refreshed; records with unflushed
    /// changes keep their in-memory values.
    async fn query(&mut self, filter: Filter) -> Result<Vec<User>, RepoError> {
        self.commit().await?;
        let db = self.db;
        let sql = match filter {
            Filter::All => format!("SELECT login, userid, projid FROM {}", TABLE_NAME),
            Filter::Group(_) => format!(
                "SELECT login, userid, projid FROM {} WHERE projid = {}",
                TABLE_NAME,
                db.param(1)
            ),
            Filter::Newest(limit) => format!(
                "SELECT login, userid, projid FROM {} ORDER BY userid DESC LIMIT {}",
                TABLE_NAME, limit
            ),
        };
        let rows: Vec<User> = with_pool!(db.pool(), pool, Db => {
            let mut query = sqlx_core::query_as::query_as::<Db, User>(&sql);
            if let Filter::Group(group) = filter {
                query = query.bind(group.get());
            }
            query.fetch_all(pool).await?
        });

        let mut loaded = Vec::with_capacity(rows.len());
        for row in rows {
            let userid = row.userid;
            match self.identity.get_mut(&userid) {
                Some(tracked) => match tracked.state {
                    EntityState::Persistent => tracked.user = row,
                    EntityState::Pending | EntityState::Dirty => {}
                    EntityState::Deleted => continue,
                },
                None => {
                    self.identity.insert(
                        userid,
                        Tracked {
                            user: row,
                            state: EntityState::Persistent,
                        },
                    );
                }
            }
            if let Some(user) = self.get(userid) {
                loaded.push(user.clone());
            }
        }
        Ok(loaded)
    }

    /// Ends the session. Uncommitted changes are discarded.
    pub fn close(self) {
        let discarded = self
            .identity
            .values()
            .filter(|tracked| tracked.state != EntityState::Persistent)
            .count();
        if discarded > 0 {
            tracing::warn!(event = "session_discarded", discarded);
        }
    }
}

/// Loads records into the session, mutates them in memory and commits.
pub struct SessionRepository<'a> {
    session: Session<'a>,
}

impl<'a> SessionRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            session: Session::new(db),
        }
    }

    pub fn session(&self) -> &Session<'a> {
        &self.session
    }

    pub fn close(self) {
        self.session.close();
    }
}

#[async_trait]
impl UserRepository for SessionRepository<'_> {
    fn strategy(&self) -> &'static str {
        "session"
    }

    async fn insert(&mut self, users: Vec<User>) -> Result<u64, RepoError> {
        self.session.add_all(users)?;
        let stats = self.session.commit().await?;
        Ok(stats.inserted)
    }

    async fn distinct_groups(&mut self) -> Result<BTreeSet<ProjId>, RepoError> {
        let users = self.session.query(Filter::All).await?;
        Ok(users.iter().map(|user| user.projid).collect())
    }

    async fn move_group(&mut self, from: ProjId, to: ProjId) -> Result<u64, RepoError> {
        let members = self.session.query(Filter::Group(from)).await?;
        for user in &members {
            self.session.set_group(user.userid, to)?;
        }
        self.session.commit().await?;
        Ok(members.len() as u64)
    }

    async fn remove_group(&mut self, group: ProjId) -> Result<u64, RepoError> {
        let members = self.session.query(Filter::Group(group)).await?;
        for user in &members {
            self.session.delete(user.userid)?;
        }
        self.session.commit().await?;
        Ok(members.len() as u64)
    }

    async fn list(&mut self, scope: ListScope) -> Result<Vec<User>, RepoError> {
        let filter = match scope {
            ListScope::All => Filter::All,
            ListScope::Newest(limit) => Filter::Newest(limit),
        };
        self.session.query(filter).await
    }
}
