/// Table every run creates, fills and drops.
pub const TABLE_NAME: &str = "users";

/// Maximum length of a login, also the `VARCHAR` width of the column.
pub const NAME_MAX_LEN: usize = 16;

/// Column order shared by every query and by the reporter.
pub const FIELDS: [&str; 3] = ["login", "userid", "projid"];

pub const DEFAULT_DB_NAME: &str = "test";

/// How many rows the "newest" dump shows.
pub const NEWEST_LIMIT: u32 = 5;

pub mod schema_defaults {
    pub const RETRIES: u32 = 3;
    pub const COOLDOWN_SECONDS: u64 = 10;
}
