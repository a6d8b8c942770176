//! Set difference between the previous and current snapshot.

use crate::facts::{PrivilegeKey, Snapshot};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
}

impl ChangeKind {
    pub fn tag(self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Removed => "REMOVED",
        }
    }
}

/// One classified change, rendered as `ADDED:<key>` or `REMOVED:<key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change<'a> {
    pub kind: ChangeKind,
    pub key: &'a PrivilegeKey,
}

impl fmt::Display for Change<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.tag(), self.key)
    }
}

/// Additions and removals between two snapshots. Additions always come first;
/// order inside each group carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub added: Vec<PrivilegeKey>,
    pub removed: Vec<PrivilegeKey>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// All changes, additions then removals.
    pub fn changes(&self) -> impl Iterator<Item = Change<'_>> {
        let added = self.added.iter().map(|key| Change {
            kind: ChangeKind::Added,
            key,
        });
        let removed = self.removed.iter().map(|key| Change {
            kind: ChangeKind::Removed,
            key,
        });
        added.chain(removed)
    }

    pub fn tags(&self) -> Vec<String> {
        self.changes().map(|c| c.to_string()).collect()
    }
}

/// Comma-joined change tags, as written to the change log line.
impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, change) in self.changes().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", change)?;
        }
        Ok(())
    }
}

pub struct DiffEngine;

impl DiffEngine {
    /// `added = new \ old`, `removed = old \ new`.
    pub fn diff(old: &Snapshot, new: &Snapshot) -> Delta {
        Delta {
            added: new.difference(old).cloned().collect(),
            removed: old.difference(new).cloned().collect(),
        }
    }
}
