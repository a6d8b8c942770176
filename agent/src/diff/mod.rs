//! Compares two snapshots and classifies the difference.

mod engine;

pub use engine::{Change, ChangeKind, Delta, DiffEngine};
