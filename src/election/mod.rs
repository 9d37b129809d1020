//! Ring-holder election
//!
//! The coordinator asks an [`ElectionOracle`] for a candidate each round. The
//! oracles here are placeholders: a production deployment would back the trait
//! with a real membership store.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::core::{Error, PeerId, Result};

/// Source of ring-holder candidates
pub trait ElectionOracle: Send {
    /// Picks the next ring-holder, or fails with [`Error::NotFound`]
    fn select(&mut self) -> Result<PeerId>;
}

impl<O: ElectionOracle + ?Sized> ElectionOracle for Box<O> {
    fn select(&mut self) -> Result<PeerId> {
        (**self).select()
    }
}

/// Uniform random choice over a fixed member list
pub struct RandomOracle {
    members: Vec<PeerId>,
    rng: StdRng,
}

impl RandomOracle {
    /// Creates an oracle seeded from the operating system
    pub fn new(members: Vec<PeerId>) -> Self {
        RandomOracle {
            members,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates an oracle with a fixed seed
    pub fn with_seed(members: Vec<PeerId>, seed: u64) -> Self {
        RandomOracle {
            members,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }
}

impl ElectionOracle for RandomOracle {
    fn select(&mut self) -> Result<PeerId> {
        self.members
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| Error::not_found("member list is empty"))
    }
}

/// Always elects the same peer
#[derive(Debug, Clone, Default)]
pub struct StaticOracle {
    holder: Option<PeerId>,
}

impl StaticOracle {
    pub fn new(holder: PeerId) -> Self {
        StaticOracle {
            holder: Some(holder),
        }
    }

    /// An oracle that never finds a candidate
    pub fn empty() -> Self {
        StaticOracle::default()
    }
}

impl ElectionOracle for StaticOracle {
    fn select(&mut self) -> Result<PeerId> {
        self.holder
            .clone()
            .ok_or_else(|| Error::not_found("no ring-holder configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio_test::{assert_err, assert_ok};

    fn members() -> Vec<PeerId> {
        ["frodo", "gotham", "springfield", "metropolis"]
            .into_iter()
            .map(PeerId::from)
            .collect()
    }

    #[test]
    fn test_random_oracle_picks_members() {
        let mut oracle = RandomOracle::with_seed(members(), 7);
        let picked: HashSet<PeerId> = (0..200).map(|_| oracle.select().unwrap()).collect();

        assert!(picked.iter().all(|p| oracle.members().contains(p)));
        // 200 draws over 4 members hit every member
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn test_random_oracle_is_reproducible_with_seed() {
        let mut a = RandomOracle::with_seed(members(), 42);
        let mut b = RandomOracle::with_seed(members(), 42);
        for _ in 0..20 {
            assert_eq!(a.select().unwrap(), b.select().unwrap());
        }
    }

    #[test]
    fn test_empty_membership_is_not_found() {
        let mut oracle = RandomOracle::new(Vec::new());
        assert!(matches!(oracle.select(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_static_oracle() {
        let mut oracle = StaticOracle::new(PeerId::from("gotham"));
        assert_eq!(assert_ok!(oracle.select()), PeerId::from("gotham"));
        assert_eq!(assert_ok!(oracle.select()), PeerId::from("gotham"));

        let mut boxed: Box<dyn ElectionOracle> = Box::new(StaticOracle::empty());
        let err = assert_err!(boxed.select());
        assert!(matches!(err, Error::NotFound(_)));
    }
}
