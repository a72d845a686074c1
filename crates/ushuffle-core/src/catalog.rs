/// Database engines a run can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    MySql,
    Gadfly,
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("no backend chosen")]
    EmptyChoice,
    #[error("unknown backend choice: {0:?}")]
    UnknownBackend(String),
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [Self::MySql, Self::Gadfly, Self::Sqlite, Self::Postgres];

    #[must_use]
    pub const fn key(&self) -> char {
        match self {
            Self::MySql => 'm',
            Self::Gadfly => 'g',
            Self::Sqlite => 's',
            Self::Postgres => 'p',
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Gadfly => "gadfly",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Label used by the interactive prompt, with the key letter in parentheses.
    #[must_use]
    pub const fn menu_label(&self) -> &'static str {
        match self {
            Self::MySql => "(M)ySQL",
            Self::Gadfly => "(G)adfly",
            Self::Sqlite => "(S)QLite",
            Self::Postgres => "(P)ostgreSQL",
        }
    }

    #[must_use]
    pub const fn is_file_based(&self) -> bool {
        matches!(self, Self::Gadfly | Self::Sqlite)
    }

    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Parses a menu answer: surrounding whitespace is ignored and only the
    /// first character counts, case-insensitively.
    pub fn from_choice(input: &str) -> Result<Self, CatalogError> {
        let trimmed = input.trim();
        let first = trimmed.chars().next().ok_or(CatalogError::EmptyChoice)?;
        Self::from_key(first).ok_or_else(|| CatalogError::UnknownBackend(trimmed.to_string()))
    }

    /// Directory holding the database file of a file-based backend.
    #[must_use]
    pub fn storage_dir(&self, db_name: &str) -> String {
        format!("{}_{}", self.as_str(), db_name)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .map_or_else(|| Self::from_choice(value), Ok)
    }
}
