mod from_row;

use crate::constants::NAME_MAX_LEN;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("group {0} is outside 1..=5")]
    GroupOutOfRange(i64),
    #[error("login {login:?} is longer than {max} characters")]
    LoginTooLong { login: String, max: usize },
}

/// Group membership bucket, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjId(u8);

impl ProjId {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn new(value: i32) -> Result<Self, RecordError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RecordError::GroupOutOfRange(i64::from(value)))
        }
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0 as i32
    }
}

impl std::fmt::Display for ProjId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub login: String,
    pub userid: i32,
    pub projid: ProjId,
}

impl User {
    pub fn new(login: impl Into<String>, userid: i32, projid: ProjId) -> Result<Self, RecordError> {
        let login = login.into();
        if login.chars().count() > NAME_MAX_LEN {
            return Err(RecordError::LoginTooLong {
                login,
                max: NAME_MAX_LEN,
            });
        }
        Ok(Self {
            login,
            userid,
            projid,
        })
    }
}
