#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
use sqlx_core::from_row::FromRow;
#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
use sqlx_core::row::Row;
#[cfg(feature = "mysql")]
use sqlx_mysql::MySqlRow;
#[cfg(feature = "postgres")]
use sqlx_postgres::PgRow;
#[cfg(feature = "sqlite")]
use sqlx_sqlite::SqliteRow;

#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
use super::*;

#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
fn parse_group(value: i32) -> Result<ProjId, sqlx_core::Error> {
    ProjId::new(value).map_err(|err| sqlx_core::Error::Decode(Box::new(err)))
}

macro_rules! impl_from_row {
    ($ty:ty, $row:ident => $body:block) => {
        #[cfg(feature = "sqlite")]
        impl FromRow<'_, SqliteRow> for $ty {
            fn from_row($row: &SqliteRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }

        #[cfg(feature = "mysql")]
        impl FromRow<'_, MySqlRow> for $ty {
            fn from_row($row: &MySqlRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }

        #[cfg(feature = "postgres")]
        impl FromRow<'_, PgRow> for $ty {
            fn from_row($row: &PgRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }
    };
}

impl_from_row!(User, row => {
        let projid: i32 = row.try_get("projid")?;
        Ok(Self {
            login: row.try_get("login")?,
            userid: row.try_get("userid")?,
            projid: parse_group(projid)?,
        })
    }
);
