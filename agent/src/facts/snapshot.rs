//! Set of privilege keys observed at one instant.
//!
//! Serialized as a JSON object mapping each key to `true`. Entries mapped to
//! `false` are dropped on load (absence means not held).

use super::{PrivilegeFact, PrivilegeKey};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::btree_set::{self, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    keys: BTreeSet<PrivilegeKey>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_fact(&mut self, fact: &PrivilegeFact) -> bool {
        self.keys.insert(fact.key())
    }

    pub fn insert(&mut self, key: PrivilegeKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &PrivilegeKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, PrivilegeKey> {
        self.keys.iter()
    }

    /// Keys in `self` that are not in `other`.
    pub fn difference<'a>(&'a self, other: &'a Snapshot) -> impl Iterator<Item = &'a PrivilegeKey> {
        self.keys.difference(&other.keys)
    }
}

impl FromIterator<PrivilegeKey> for Snapshot {
    fn from_iter<I: IntoIterator<Item = PrivilegeKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a PrivilegeFact> for Snapshot {
    fn from_iter<I: IntoIterator<Item = &'a PrivilegeFact>>(iter: I) -> Self {
        iter.into_iter().map(PrivilegeFact::key).collect()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a PrivilegeKey;
    type IntoIter = btree_set::Iter<'a, PrivilegeKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for key in &self.keys {
            map.serialize_entry(key.as_str(), &true)?;
        }
        map.end()
    }
}

struct SnapshotVisitor;

impl<'de> Visitor<'de> for SnapshotVisitor {
    type Value = Snapshot;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of privilege keys to booleans")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Snapshot, A::Error> {
        let mut snapshot = Snapshot::new();
        while let Some((key, held)) = access.next_entry::<String, bool>()? {
            if held {
                snapshot.insert(PrivilegeKey::from_raw(key));
            }
        }
        Ok(snapshot)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor)
    }
}
