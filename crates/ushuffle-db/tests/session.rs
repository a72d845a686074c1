#![cfg(feature = "sqlite")]

mod support;

use support::{group, setup_db, Strategy};
use ushuffle_core::User;
use ushuffle_db::{
    EntityState, FlushStats, ListScope, RepoError, Session, SessionError, SessionRepository,
    UserRepository,
};

fn user(login: &str, userid: i32, projid: i32) -> User {
    User::new(login, userid, group(projid)).expect("user")
}

#[tokio::test]
async fn pending_records_are_written_on_commit() {
    let (_dir, db) = setup_db(Strategy::Session).await;
    let mut session = Session::new(&db);
    session
        .add_all([user("aaron", 8312, 1), user("dave", 7306, 2)])
        .expect("add");
    assert_eq!(session.state(8312), Some(EntityState::Pending));
    assert!(session.has_pending_changes());

    let stats = session.commit().await.expect("commit");
    assert_eq!(
        stats,
        FlushStats {
            inserted: 2,
            updated: 0,
            deleted: 0
        }
    );
    assert_eq!(session.state(8312), Some(EntityState::Persistent));
    assert!(!session.has_pending_changes());
    assert_eq!(
        session.commit().await.expect("empty commit"),
        FlushStats::default()
    );
    session.close();
    db.close().await;
}

#[tokio::test]
async fn duplicate_identity_is_rejected() {
    let (_dir, db) = setup_db(Strategy::Session).await;
    let mut session = Session::new(&db);
    session.add(user("aaron", 8312, 1)).expect("add");
    let err = session
        .add(user("angela", 8312, 2))
        .expect_err("same userid");
    assert_eq!(err, SessionError::DuplicateIdentity(8312));
    assert_eq!(session.get(8312).map(|u| u.login.as_str()), Some("aaron"));
    session.close();
    db.close().await;
}

#[tokio::test]
async fn changed_group_marks_record_dirty() {
    let (_dir, db) = setup_db(Strategy::Session).await;
    let mut session = Session::new(&db);
    session.add(user("ernie", 7410, 3)).expect("add");
    session.commit().await.expect("commit");

    session.set_group(7410, group(3)).expect("same group");
    assert_eq!(session.state(7410), Some(EntityState::Persistent));

    session.set_group(7410, group(5)).expect("move");
    assert_eq!(session.state(7410), Some(EntityState::Dirty));
    let stats = session.commit().await.expect("commit");
    assert_eq!(stats.updated, 1);
    session.close();

    let mut fresh = SessionRepository::new(&db);
    let users = fresh.list(ListScope::All).await.expect("list");
    assert_eq!(users, vec![user("ernie", 7410, 5)]);
    fresh.close();
    db.close().await;
}

#[tokio::test]
async fn deleting_a_pending_record_forgets_it() {
    let (_dir, db) = setup_db(Strategy::Session).await;
    let mut session = Session::new(&db);
    session.add(user("elliot", 7911, 4)).expect("add");
    session.delete(7911).expect("delete");
    assert_eq!(session.state(7911), None);
    assert!(!session.has_pending_changes());
    assert_eq!(
        session.commit().await.expect("commit"),
        FlushStats::default()
    );
    assert_eq!(
        session.delete(7911).expect_err("gone"),
        SessionError::NotTracked(7911)
    );
    session.close();
    db.close().await;
}

#[tokio::test]
async fn deleted_records_are_hidden_then_removed() {
    let (_dir, db) = setup_db(Strategy::Session).await;
    let mut session = Session::new(&db);
    session
        .add_all([user("davina", 7902, 2), user("angela", 7603, 2)])
        .expect("add");
    session.commit().await.expect("commit");

    session.delete(7902).expect("delete");
    assert_eq!(session.state(7902), Some(EntityState::Deleted));
    assert!(session.get(7902).is_none());
    assert!(session.set_group(7902, group(1)).is_err());

    let stats = session.commit().await.expect("commit");
    assert_eq!(stats.deleted, 1);
    assert_eq!(session.state(7902), None);
    session.close();

    let mut repo = SessionRepository::new(&db);
    let users = repo.list(ListScope::All).await.expect("list");
    assert_eq!(users, vec![user("angela", 7603, 2)]);
    repo.close();
    db.close().await;
}

#[tokio::test]
async fn failed_commit_keeps_pending_state() {
    let (_dir, db) = setup_db(Strategy::Session).await;
    let mut seeded = Session::new(&db);
    seeded.add(user("aaron", 8312, 1)).expect("add");
    seeded.commit().await.expect("commit");
    seeded.close();

    let mut session = Session::new(&db);
    session
        .add_all([user("dave", 7306, 1), user("aaron", 8312, 2)])
        .expect("add");
    let err = session.commit().await.expect_err("primary key collision");
    assert!(matches!(err, RepoError::Database(_)));
    assert_eq!(session.state(7306), Some(EntityState::Pending));
    assert_eq!(session.state(8312), Some(EntityState::Pending));
    session.close();

    let mut repo = SessionRepository::new(&db);
    let users = repo.list(ListScope::All).await.expect("list");
    assert_eq!(
        users,
        vec![user("aaron", 8312, 1)],
        "transaction rolled back"
    );
    repo.close();
    db.close().await;
}

#[tokio::test]
async fn repository_queries_flush_first() {
    let (_dir, db) = setup_db(Strategy::Session).await;
    let mut repo = SessionRepository::new(&db);
    repo.insert(vec![user("aaron", 8312, 1), user("dave", 7306, 3)])
        .await
        .expect("insert");
    assert_eq!(repo.session().state(7306), Some(EntityState::Persistent));

    let groups = repo.distinct_groups().await.expect("groups");
    assert_eq!(
        groups.into_iter().collect::<Vec<_>>(),
        vec![group(1), group(3)]
    );

    assert_eq!(repo.move_group(group(3), group(1)).await.expect("move"), 1);
    assert!(!repo.session().has_pending_changes());
    let users = repo.list(ListScope::All).await.expect("list");
    assert!(users.iter().all(|u| u.projid == group(1)));
    repo.close();
    db.close().await;
}
