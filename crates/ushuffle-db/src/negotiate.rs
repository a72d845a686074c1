use ushuffle_core::BackendKind;

use crate::backend::{Backend, BackendRegistry, ErrorClass};
use crate::Database;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnavailableReason {
    #[error("no driver available")]
    DriverUnavailable,
    #[error("invalid database name {0:?}")]
    InvalidDatabaseName(String),
    #[error("storage directory unusable: {0}")]
    Storage(String),
    #[error("unreachable: {0}")]
    ConnectionUnavailable(String),
}

/// Terminal outcome of [`Negotiator::connect`]: the run cannot use this backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{backend} not supported or unreachable ({reason})")]
pub struct Unavailable {
    pub backend: BackendKind,
    pub reason: UnavailableReason,
}

impl Unavailable {
    fn new(backend: BackendKind, reason: UnavailableReason) -> Self {
        Self { backend, reason }
    }
}

pub struct Negotiator<'a> {
    registry: &'a BackendRegistry,
}

impl<'a> Negotiator<'a> {
    pub fn new(registry: &'a BackendRegistry) -> Self {
        Self { registry }
    }

    /// Opens `database` on `kind`, creating the database once if the backend
    /// reports it missing.
    pub async fn connect(
        &self,
        kind: BackendKind,
        database: &str,
    ) -> Result<Database, Unavailable> {
        let Some(backend) = self.registry.get(kind) else {
            tracing::warn!(event = "db_driver_missing", backend = %kind);
            return Err(Unavailable::new(kind, UnavailableReason::DriverUnavailable));
        };
        if !is_valid_database_name(database) {
            return Err(Unavailable::new(
                kind,
                UnavailableReason::InvalidDatabaseName(database.to_string()),
            ));
        }
        ensure_storage_dir(backend, database)?;

        let first_err = match backend.open(database).await {
            Ok(pool) => {
                tracing::info!(event = "db_connected", backend = %kind, database);
                return Ok(Database::new(kind, pool));
            }
            Err(err) => err,
        };
        if backend.classify(&first_err) != ErrorClass::Missing {
            tracing::warn!(event = "db_connect_failed", backend = %kind, error = %first_err);
            return Err(connection_unavailable(kind, &first_err));
        }

        tracing::info!(event = "db_missing", backend = %kind, database, "provisioning database");
        if let Err(err) = backend.create_database(database).await {
            tracing::warn!(event = "db_provision_failed", backend = %kind, error = %err);
            return Err(connection_unavailable(kind, &err));
        }
        tracing::info!(event = "db_provisioned", backend = %kind, database);

        match backend.open(database).await {
            Ok(pool) => {
                tracing::info!(event = "db_connected", backend = %kind, database);
                Ok(Database::new(kind, pool))
            }
            Err(err) => {
                tracing::warn!(event = "db_connect_failed", backend = %kind, error = %err);
                Err(connection_unavailable(kind, &err))
            }
        }
    }
}

fn connection_unavailable(kind: BackendKind, err: &sqlx_core::Error) -> Unavailable {
    Unavailable::new(
        kind,
        UnavailableReason::ConnectionUnavailable(err.to_string()),
    )
}

fn ensure_storage_dir(backend: &dyn Backend, database: &str) -> Result<(), Unavailable> {
    let Some(dir) = backend.storage_dir(database) else {
        return Ok(());
    };
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(&dir).map_err(|err| {
        Unavailable::new(
            backend.kind(),
            UnavailableReason::Storage(format!("{}: {}", dir.display(), err)),
        )
    })?;
    tracing::debug!(event = "storage_dir_created", path = %dir.display());
    Ok(())
}

/// Names end up inside `CREATE DATABASE`, so only plain identifiers pass.
pub fn is_valid_database_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names_are_plain_identifiers() {
        assert!(is_valid_database_name("test"));
        assert!(is_valid_database_name("shuffle_2"));
        assert!(!is_valid_database_name(""));
        assert!(!is_valid_database_name("test; drop"));
        assert!(!is_valid_database_name("a-b"));
        assert!(!is_valid_database_name("../etc"));
    }

    #[test]
    fn unavailable_message_names_backend() {
        let err = Unavailable::new(BackendKind::Gadfly, UnavailableReason::DriverUnavailable);
        assert_eq!(
            err.to_string(),
            "gadfly not supported or unreachable (no driver available)"
        );
    }
}
