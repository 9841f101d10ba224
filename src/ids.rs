//! Typed surrogate ids and the name -> id maps that join stages together.
//!
//! Maps are filled only from rows the database actually returned, so a row
//! that was dropped by the loader never becomes resolvable downstream.

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

macro_rules! surrogate_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                $name(v)
            }
        }
    };
}

surrogate_id!(ClubId);
surrogate_id!(PlayerId);
surrogate_id!(ManagerId);
surrogate_id!(CompetitionId);
surrogate_id!(SeasonId);
surrogate_id!(AwardId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<I> {
    Found(I),
    Missing,
}

impl<I> Resolved<I> {
    pub fn id(self) -> Option<I> {
        match self {
            Resolved::Found(id) => Some(id),
            Resolved::Missing => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdMap<K, I> {
    entries: HashMap<K, I>,
}

impl<K, I> Default for IdMap<K, I> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, I: Copy> IdMap<K, I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; returns the id that was replaced, if any.
    pub fn insert(&mut self, key: K, id: I) -> Option<I> {
        self.entries.insert(key, id)
    }

    pub fn resolve<Q>(&self, key: &Q) -> Resolved<I>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            Some(id) => Resolved::Found(*id),
            None => Resolved::Missing,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type ClubMap = IdMap<String, ClubId>;
pub type PlayerMap = IdMap<String, PlayerId>;
pub type ManagerMap = IdMap<String, ManagerId>;
pub type CompetitionMap = IdMap<String, CompetitionId>;
pub type AwardMap = IdMap<String, AwardId>;
pub type SeasonMap = IdMap<(ManagerId, i64), SeasonId>;
