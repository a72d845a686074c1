use crate::models::ProjId;

/// Result of moving every member of one group to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub from: ProjId,
    pub to: ProjId,
    pub moved: u64,
}

impl std::fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} users moved) from ({}) to ({})",
            self.moved, self.from, self.to
        )
    }
}

/// Result of removing a randomly chosen group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Nobody was in the group, so no statement ran.
    Absent { group: ProjId },
    Removed { group: ProjId, count: u64 },
}

impl DeleteOutcome {
    #[must_use]
    pub const fn removed(&self) -> Option<u64> {
        match self {
            Self::Absent { .. } => None,
            Self::Removed { count, .. } => Some(*count),
        }
    }
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent { group } => write!(f, "(group #{group}; -1 users removed)"),
            Self::Removed { group, count } => write!(f, "(group #{group}; {count} users removed)"),
        }
    }
}
