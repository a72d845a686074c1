#![allow(dead_code)]
#![cfg(feature = "sqlite")]

use std::collections::BTreeMap;
use std::time::Duration;

use tempfile::TempDir;
use ushuffle_core::{BackendKind, ProjId, User};
use ushuffle_db::{
    BackendOptions, BackendRegistry, Database, DirectRepository, DropMode, Negotiator,
    SchemaManager, SchemaOutcome, SessionRepository, TableDdl, TableSpec, UserRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    Session,
}

pub const STRATEGIES: [Strategy; 2] = [Strategy::Direct, Strategy::Session];

impl Strategy {
    pub fn table(self) -> TableSpec {
        match self {
            Self::Direct => TableSpec::PLAIN,
            Self::Session => TableSpec::MAPPED,
        }
    }

    pub fn repo(self, db: &Database) -> Box<dyn UserRepository + '_> {
        match self {
            Self::Direct => Box::new(DirectRepository::new(db)),
            Self::Session => Box::new(SessionRepository::new(db)),
        }
    }
}

pub fn sqlite_registry(dir: &TempDir) -> BackendRegistry {
    BackendRegistry::from_options(&BackendOptions {
        data_dir: dir.path().to_path_buf(),
        acquire_timeout: Duration::from_secs(5),
        ..BackendOptions::default()
    })
}

/// Fresh SQLite database in its own temp dir, with the table for `strategy`.
pub async fn setup_db(strategy: Strategy) -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = sqlite_registry(&dir);
    let db = Negotiator::new(&registry)
        .connect(BackendKind::Sqlite, "test")
        .await
        .expect("sqlite connect");
    db.drop_table(DropMode::IfExists).await.expect("drop");
    let outcome = SchemaManager::new(0, Duration::ZERO)
        .create_table(&db, &strategy.table())
        .await
        .expect("create table");
    assert!(matches!(outcome, SchemaOutcome::Created { attempts: 1 }));
    (dir, db)
}

pub fn group(value: i32) -> ProjId {
    ProjId::new(value).expect("group")
}

pub fn count_by_group(users: &[User]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for user in users {
        *counts.entry(user.projid.get()).or_insert(0) += 1;
    }
    counts
}

pub fn sorted_identities(users: &[User]) -> Vec<(String, i32)> {
    let mut ids: Vec<_> = users
        .iter()
        .map(|user| (user.login.clone(), user.userid))
        .collect();
    ids.sort();
    ids
}
