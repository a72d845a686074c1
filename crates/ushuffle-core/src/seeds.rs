use std::collections::HashSet;

/// Identity of one seeded record. The group is drawn separately at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed {
    pub login: &'static str,
    pub userid: i32,
}

pub const NAMES: [(&str, i32); 6] = [
    ("aaron", 8312),
    ("angela", 7603),
    ("dave", 7306),
    ("davina", 7902),
    ("elliot", 7911),
    ("ernie", 7410),
];

/// Yields every seed exactly once. Order comes from draining a hash set and is
/// not stable between runs.
pub fn seeds() -> impl Iterator<Item = Seed> {
    let pick: HashSet<Seed> = NAMES
        .iter()
        .map(|&(login, userid)| Seed { login, userid })
        .collect();
    pick.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NAME_MAX_LEN;

    #[test]
    fn every_seed_is_yielded_once() {
        let mut drawn: Vec<_> = seeds().map(|seed| (seed.login, seed.userid)).collect();
        drawn.sort_unstable();
        let mut expected = NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(drawn, expected);
    }

    #[test]
    fn seed_logins_fit_the_column() {
        assert!(NAMES.iter().all(|(login, _)| login.len() <= NAME_MAX_LEN));
    }
}
