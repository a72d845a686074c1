use std::io::Write;

use anyhow::Context;
use ushuffle_core::{seeds, BackendKind, GroupDraw};
use ushuffle_db::{
    insert_seeds, remove_random_group, shuffle_group, BackendRegistry, Database, DirectRepository,
    DropMode, ListScope, Negotiator, SchemaManager, SchemaOutcome, SessionRepository, TableDdl,
    TableSpec, UserRepository,
};

use crate::cli_args::Strategy;
use crate::report::Reporter;

pub struct RunPlan {
    pub backend: BackendKind,
    pub strategy: Strategy,
    pub db_name: String,
    pub schema: SchemaManager,
}

struct StepTitles {
    insert: &'static str,
    newest: Option<&'static str>,
    update: &'static str,
    delete: &'static str,
}

const DIRECT_STEPS: StepTitles = StepTitles {
    insert: "Inserting names into table",
    newest: None,
    update: "Randomly moving folks",
    delete: "Randomly choosing group",
};

const SESSION_STEPS: StepTitles = StepTitles {
    insert: "Insert names into table",
    newest: Some("Top 5 newest employees"),
    update: "Move users to a random group",
    delete: "Randomly delete group",
};

/// Connects, runs every step of `plan.strategy` and closes the connection,
/// whether or not a step failed.
pub async fn run<W: Write>(
    plan: &RunPlan,
    registry: &BackendRegistry,
    draw: &mut dyn GroupDraw,
    reporter: &mut Reporter<W>,
) -> anyhow::Result<()> {
    let target = match plan.strategy {
        Strategy::Direct => plan.backend.as_str(),
        Strategy::Session => plan.db_name.as_str(),
    };
    reporter.banner(&format!("Connect to '{}' database", target))?;
    let db = Negotiator::new(registry)
        .connect(plan.backend, &plan.db_name)
        .await?;
    tracing::info!(
        event = "run_started",
        backend = %plan.backend,
        strategy = plan.strategy.as_str()
    );

    let result = match plan.strategy {
        Strategy::Direct => run_direct(&db, plan, draw, reporter).await,
        Strategy::Session => run_session(&db, plan, draw, reporter).await,
    };
    let result = result.and_then(|()| Ok(reporter.banner("Close cxns")?));
    db.close().await;
    result.with_context(|| plan.backend.to_string())
}

async fn run_direct<W: Write>(
    db: &Database,
    plan: &RunPlan,
    draw: &mut dyn GroupDraw,
    reporter: &mut Reporter<W>,
) -> anyhow::Result<()> {
    reporter.banner("Creating users table")?;
    create_table(db, &plan.schema, TableSpec::PLAIN).await?;

    let mut repo = DirectRepository::new(db);
    crud_steps(&mut repo, &DIRECT_STEPS, draw, reporter).await?;

    reporter.banner("Dropping users table")?;
    db.drop_table(DropMode::Strict)
        .await
        .context("drop table failed")?;
    Ok(())
}

async fn run_session<W: Write>(
    db: &Database,
    plan: &RunPlan,
    draw: &mut dyn GroupDraw,
    reporter: &mut Reporter<W>,
) -> anyhow::Result<()> {
    reporter.banner("Create users table (drop old one if appl.)")?;
    db.drop_table(DropMode::IfExists)
        .await
        .context("drop table failed")?;
    create_table(db, &plan.schema, TableSpec::MAPPED).await?;

    let mut repo = SessionRepository::new(db);
    let steps = crud_steps(&mut repo, &SESSION_STEPS, draw, reporter).await;
    repo.close();
    steps?;

    reporter.banner("Drop users table")?;
    db.drop_table(DropMode::Strict)
        .await
        .context("drop table failed")?;
    Ok(())
}

async fn create_table(
    db: &Database,
    schema: &SchemaManager,
    spec: TableSpec,
) -> anyhow::Result<()> {
    let outcome = schema
        .create_table(db, &spec)
        .await
        .context("create table failed")?;
    // Exhausted retries leave whatever table is there; the run goes on.
    if let SchemaOutcome::Exhausted { attempts } = outcome {
        tracing::warn!(event = "schema_kept_existing", attempts);
    }
    Ok(())
}

async fn crud_steps<R, W>(
    repo: &mut R,
    titles: &StepTitles,
    draw: &mut dyn GroupDraw,
    reporter: &mut Reporter<W>,
) -> anyhow::Result<()>
where
    R: UserRepository + ?Sized,
    W: Write,
{
    reporter.banner(titles.insert)?;
    insert_seeds(repo, seeds(), draw)
        .await
        .context("insert failed")?;
    dump(repo, ListScope::All, reporter).await?;

    if let Some(title) = titles.newest {
        reporter.banner(title)?;
        dump(repo, ListScope::NEWEST, reporter).await?;
    }

    reporter.banner(titles.update)?;
    let update = shuffle_group(repo, draw).await.context("update failed")?;
    reporter.outcome(&update)?;
    dump(repo, ListScope::All, reporter).await?;

    reporter.banner(titles.delete)?;
    let delete = remove_random_group(repo, draw)
        .await
        .context("delete failed")?;
    reporter.outcome(&delete)?;
    dump(repo, ListScope::All, reporter).await?;
    Ok(())
}

async fn dump<R, W>(
    repo: &mut R,
    scope: ListScope,
    reporter: &mut Reporter<W>,
) -> anyhow::Result<()>
where
    R: UserRepository + ?Sized,
    W: Write,
{
    let users = repo.list(scope).await.context("list failed")?;
    reporter.dump(&users)?;
    Ok(())
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::time::Duration;

    use super::*;
    use ushuffle_core::ScriptedGroups;
    use ushuffle_db::{BackendOptions, ErrorClass, Unavailable, UnavailableReason};

    // Inserts land 3 users in group 2, the move sends them to 4, then 4 goes.
    const SCRIPT: [i32; 9] = [2, 2, 4, 1, 2, 3, 2, 4, 4];

    fn registry(dir: &tempfile::TempDir) -> BackendRegistry {
        BackendRegistry::from_options(&BackendOptions {
            data_dir: dir.path().to_path_buf(),
            ..BackendOptions::default()
        })
    }

    fn plan(backend: BackendKind, strategy: Strategy) -> RunPlan {
        RunPlan {
            backend,
            strategy,
            db_name: "test".to_string(),
            schema: SchemaManager::new(3, Duration::ZERO),
        }
    }

    async fn run_to_string(
        registry: &BackendRegistry,
        plan: &RunPlan,
    ) -> (anyhow::Result<()>, String) {
        let mut draw = ScriptedGroups::from_values(&SCRIPT).expect("script");
        let mut reporter = Reporter::new(Vec::new());
        let result = run(plan, registry, &mut draw, &mut reporter).await;
        let output = String::from_utf8(reporter.into_inner()).expect("utf8");
        (result, output)
    }

    fn banners(output: &str) -> Vec<&str> {
        output
            .lines()
            .filter_map(|line| line.strip_prefix("*** "))
            .collect()
    }

    fn header_count(output: &str) -> usize {
        output
            .lines()
            .filter(|line| line.starts_with("LOGIN "))
            .count()
    }

    async fn assert_table_dropped(registry: &BackendRegistry) {
        let db = Negotiator::new(registry)
            .connect(BackendKind::Sqlite, "test")
            .await
            .expect("reconnect");
        let err = db
            .drop_table(DropMode::Strict)
            .await
            .expect_err("table already dropped");
        assert_eq!(db.classify(&err), ErrorClass::Missing);
        db.close().await;
    }

    #[tokio::test]
    async fn direct_run_reports_every_step() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry(&dir);
        let (result, output) =
            run_to_string(&registry, &plan(BackendKind::Sqlite, Strategy::Direct)).await;
        result.expect("run");

        assert_eq!(
            banners(&output),
            vec![
                "Connect to 'sqlite' database",
                "Creating users table",
                "Inserting names into table",
                "Randomly moving folks",
                "Randomly choosing group",
                "Dropping users table",
                "Close cxns",
            ]
        );
        assert!(output.contains("\t(3 users moved) from (2) to (4)\n"));
        assert!(output.contains("\t(group #4; 4 users removed)\n"));
        assert_eq!(header_count(&output), 3);
        assert!(dir.path().join("sqlite_test").join("test").is_file());
        assert_table_dropped(&registry).await;
    }

    #[tokio::test]
    async fn session_run_adds_newest_dump() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry(&dir);
        let (result, output) =
            run_to_string(&registry, &plan(BackendKind::Sqlite, Strategy::Session)).await;
        result.expect("run");

        assert_eq!(
            banners(&output),
            vec![
                "Connect to 'test' database",
                "Create users table (drop old one if appl.)",
                "Insert names into table",
                "Top 5 newest employees",
                "Move users to a random group",
                "Randomly delete group",
                "Drop users table",
                "Close cxns",
            ]
        );
        assert_eq!(header_count(&output), 4);
        let newest: Vec<&str> = output
            .split("*** Top 5 newest employees\n\n")
            .nth(1)
            .expect("newest section")
            .lines()
            .skip(1)
            .take_while(|line| !line.is_empty())
            .collect();
        assert_eq!(newest.len(), 5);
        assert!(newest[0].starts_with("Aaron      8312"));
        assert!(output.contains("\t(group #4; 4 users removed)\n"));
        assert_table_dropped(&registry).await;
    }

    #[tokio::test]
    async fn leftover_table_is_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry(&dir);
        let db = Negotiator::new(&registry)
            .connect(BackendKind::Sqlite, "test")
            .await
            .expect("connect");
        db.create_table(&TableSpec::PLAIN).await.expect("leftover");
        db.close().await;

        let (result, output) =
            run_to_string(&registry, &plan(BackendKind::Sqlite, Strategy::Direct)).await;
        result.expect("run");
        assert!(output.contains("\t(3 users moved) from (2) to (4)\n"));
    }

    #[tokio::test]
    async fn gadfly_stops_after_connect_banner() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = registry(&dir);
        let (result, output) =
            run_to_string(&registry, &plan(BackendKind::Gadfly, Strategy::Direct)).await;

        let err = result.expect_err("gadfly unavailable");
        let unavailable = err.downcast_ref::<Unavailable>().expect("unavailable");
        assert_eq!(unavailable.reason, UnavailableReason::DriverUnavailable);
        assert_eq!(
            err.to_string(),
            "gadfly not supported or unreachable (no driver available)"
        );
        assert_eq!(output, "*** Connect to 'gadfly' database\n");
    }
}
