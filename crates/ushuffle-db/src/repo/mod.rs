use std::collections::BTreeSet;

use async_trait::async_trait;
use ushuffle_core::{
    draw_move, DeleteOutcome, GroupDraw, ProjId, RecordError, Seed, UpdateOutcome, User,
    NEWEST_LIMIT,
};

mod direct;
mod session;

pub use direct::DirectRepository;
pub use session::{EntityState, FlushStats, Session, SessionError, SessionRepository};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Database(#[from] sqlx_core::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    /// Highest `userid` first, at most this many rows.
    Newest(u32),
}

impl ListScope {
    pub const NEWEST: Self = Self::Newest(NEWEST_LIMIT);
}

/// Storage steps shared by both execution strategies. Every mutating call is
/// its own transaction and has committed when it returns.
#[async_trait]
pub trait UserRepository: Send {
    fn strategy(&self) -> &'static str;

    async fn insert(&mut self, users: Vec<User>) -> Result<u64, RepoError>;

    async fn distinct_groups(&mut self) -> Result<BTreeSet<ProjId>, RepoError>;

    /// Moves every record in `from` to `to`, returning how many moved.
    async fn move_group(&mut self, from: ProjId, to: ProjId) -> Result<u64, RepoError>;

    /// Deletes every record in `group`, returning how many went.
    async fn remove_group(&mut self, group: ProjId) -> Result<u64, RepoError>;

    async fn list(&mut self, scope: ListScope) -> Result<Vec<User>, RepoError>;
}

/// Inserts one record per seed, each with a freshly drawn group.
pub async fn insert_seeds<R>(
    repo: &mut R,
    seeds: impl IntoIterator<Item = Seed>,
    draw: &mut dyn GroupDraw,
) -> Result<u64, RepoError>
where
    R: UserRepository + ?Sized,
{
    let users = seeds
        .into_iter()
        .map(|seed| User::new(seed.login, seed.userid, draw.draw()))
        .collect::<Result<Vec<_>, _>>()?;
    let inserted = repo.insert(users).await?;
    tracing::info!(
        event = "users_inserted",
        strategy = repo.strategy(),
        inserted
    );
    Ok(inserted)
}

/// Moves a random group into a different random group.
pub async fn shuffle_group<R>(
    repo: &mut R,
    draw: &mut dyn GroupDraw,
) -> Result<UpdateOutcome, RepoError>
where
    R: UserRepository + ?Sized,
{
    let (from, to) = draw_move(draw);
    let moved = repo.move_group(from, to).await?;
    tracing::info!(
        event = "group_moved",
        strategy = repo.strategy(),
        from = from.get(),
        to = to.get(),
        moved
    );
    Ok(UpdateOutcome { from, to, moved })
}

/// Removes a random group, touching nothing when no record is in it.
pub async fn remove_random_group<R>(
    repo: &mut R,
    draw: &mut dyn GroupDraw,
) -> Result<DeleteOutcome, RepoError>
where
    R: UserRepository + ?Sized,
{
    let group = draw.draw();
    let present = repo.distinct_groups().await?;
    if !present.contains(&group) {
        tracing::info!(
            event = "group_absent",
            strategy = repo.strategy(),
            group = group.get()
        );
        return Ok(DeleteOutcome::Absent { group });
    }
    let count = repo.remove_group(group).await?;
    tracing::info!(
        event = "group_removed",
        strategy = repo.strategy(),
        group = group.get(),
        count
    );
    Ok(DeleteOutcome::Removed { group, count })
}
