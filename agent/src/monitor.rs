//! Collect → diff → persist cycle and the polling loop around it.
//!
//! [`Monitor`] owns the previous snapshot. It is replaced only after a
//! successful collection, so a failed cycle never disturbs the baseline used
//! by the next one.

use crate::collectors::{CatalogSource, PrivilegeCollector};
use crate::diff::{Delta, DiffEngine};
use crate::error::CollectError;
use crate::facts::Snapshot;
use crate::storage::StateFile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

/// What a successful cycle observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No previous snapshot: the current one was recorded without diffing.
    Baseline { privileges: usize },
    Unchanged,
    Changed(Delta),
}

pub struct Monitor<S> {
    collector: PrivilegeCollector<S>,
    store: StateFile,
    role: String,
    previous: Snapshot,
    cycle_timeout: Option<Duration>,
}

impl<S: CatalogSource> Monitor<S> {
    /// Load persisted state once and prepare to monitor `role`.
    pub fn new(collector: PrivilegeCollector<S>, store: StateFile, role: impl Into<String>) -> Self {
        let previous = store.load();
        Self {
            collector,
            store,
            role: role.into(),
            previous,
            cycle_timeout: None,
        }
    }

    /// Abort collections that take longer than `limit`.
    pub fn with_cycle_timeout(mut self, limit: Option<Duration>) -> Self {
        self.cycle_timeout = limit;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    async fn collect(&self) -> Result<Snapshot, CollectError> {
        let collect = self.collector.collect(&self.role);
        match self.cycle_timeout {
            Some(limit) => tokio::time::timeout(limit, collect)
                .await
                .map_err(|_| CollectError::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => collect.await,
        }
    }

    /// Run one cycle. On collection failure nothing is diffed, replaced or
    /// written. A failed write is logged; the in-memory snapshot still advances.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CollectError> {
        let current = self.collect().await?;

        let outcome = if self.previous.is_empty() {
            CycleOutcome::Baseline {
                privileges: current.len(),
            }
        } else {
            let delta = DiffEngine::diff(&self.previous, &current);
            if delta.is_empty() {
                CycleOutcome::Unchanged
            } else {
                CycleOutcome::Changed(delta)
            }
        };

        self.previous = current;
        if let Err(e) = self.store.write(&self.previous) {
            error!(error = %e, "failed to persist state");
        }
        Ok(outcome)
    }

    /// Poll until `stop` is set, pausing `interval` after each cycle.
    /// Cycle errors are logged and the loop continues.
    pub async fn run(&mut self, interval: Duration, stop: &AtomicBool) {
        let mut cycle: u64 = 0;
        while !stop.load(Ordering::Relaxed) {
            cycle += 1;
            match self.run_cycle().await {
                Ok(outcome) => log_outcome(cycle, &self.role, &outcome),
                Err(e) => error!(cycle, error = %e, "privilege collection failed, skipping cycle"),
            }
            pause(interval, stop).await;
        }
    }
}

/// Sleep in one-second slices so a stop request is noticed promptly.
async fn pause(interval: Duration, stop: &AtomicBool) {
    let mut remaining = interval;
    while !remaining.is_zero() && !stop.load(Ordering::Relaxed) {
        let step = remaining.min(Duration::from_secs(1));
        tokio::time::sleep(step).await;
        remaining -= step;
    }
}

pub fn log_outcome(cycle: u64, role: &str, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Baseline { privileges } => {
            info!(cycle, role, privileges, "starting monitoring, baseline recorded");
        }
        CycleOutcome::Unchanged => debug!(cycle, role, "no privilege changes"),
        CycleOutcome::Changed(delta) => {
            info!(
                cycle,
                role,
                added = delta.added.len(),
                removed = delta.removed.len(),
                changes = %delta,
                "changes detected"
            );
            for change in delta.changes() {
                let kind = change.key.parse().ok().map(|f| f.kind());
                info!(
                    change = change.kind.tag(),
                    key = %change.key,
                    fact_kind = ?kind,
                    "privilege change"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::PrivilegeFact;
    use std::sync::Mutex;

    /// Catalog whose contents and failure mode can be swapped between cycles.
    #[derive(Default)]
    struct ScriptedCatalog {
        facts: Mutex<Vec<PrivilegeFact>>,
        failing: AtomicBool,
        stalled: AtomicBool,
    }

    impl ScriptedCatalog {
        async fn rows(&self, keep: fn(&PrivilegeFact) -> bool) -> Result<Vec<PrivilegeFact>, sqlx::Error> {
            if self.stalled.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.load(Ordering::Relaxed) {
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(self.facts.lock().unwrap().iter().filter(|f| keep(f)).cloned().collect())
        }
    }

    impl CatalogSource for &ScriptedCatalog {
        async fn table_grants(&self, _role: &str) -> Result<Vec<PrivilegeFact>, sqlx::Error> {
            self.rows(|f| matches!(f, PrivilegeFact::Table { .. })).await
        }

        async fn usage_grants(&self, _role: &str) -> Result<Vec<PrivilegeFact>, sqlx::Error> {
            self.rows(|f| matches!(f, PrivilegeFact::Schema { .. })).await
        }

        async fn database_connects(&self, _role: &str) -> Result<Vec<PrivilegeFact>, sqlx::Error> {
            self.rows(|f| matches!(f, PrivilegeFact::Database { .. })).await
        }
    }

    #[tokio::test]
    async fn first_cycle_is_baseline_then_changes_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ScriptedCatalog::default();
        *catalog.facts.lock().unwrap() = vec![PrivilegeFact::table("monitorado", "SELECT", "public", "users")];

        let store = StateFile::new(dir.path().join("state.json"));
        let mut monitor = Monitor::new(PrivilegeCollector::new(&catalog), store, "monitorado");

        assert_eq!(
            monitor.run_cycle().await.unwrap(),
            CycleOutcome::Baseline { privileges: 1 }
        );
        assert_eq!(monitor.run_cycle().await.unwrap(), CycleOutcome::Unchanged);

        catalog
            .facts
            .lock()
            .unwrap()
            .push(PrivilegeFact::schema("monitorado", "USAGE", "public"));
        match monitor.run_cycle().await.unwrap() {
            CycleOutcome::Changed(delta) => {
                assert_eq!(delta.tags(), vec!["ADDED:SCHEMA:monitorado:USAGE:public"]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_collection_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let catalog = ScriptedCatalog::default();
        *catalog.facts.lock().unwrap() = vec![PrivilegeFact::database("monitorado", "testdb")];

        let mut monitor = Monitor::new(PrivilegeCollector::new(&catalog), StateFile::new(&path), "monitorado");
        monitor.run_cycle().await.unwrap();
        let before = std::fs::read(&path).unwrap();
        let previous = monitor.previous().clone();

        catalog.failing.store(true, Ordering::Relaxed);
        assert!(monitor.run_cycle().await.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(monitor.previous(), &previous);
    }

    #[tokio::test]
    async fn failed_save_still_advances_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("state.json");
        let catalog = ScriptedCatalog::default();
        *catalog.facts.lock().unwrap() = vec![PrivilegeFact::schema("monitorado", "USAGE", "public")];

        let mut monitor = Monitor::new(PrivilegeCollector::new(&catalog), StateFile::new(&path), "monitorado");
        assert_eq!(
            monitor.run_cycle().await.unwrap(),
            CycleOutcome::Baseline { privileges: 1 }
        );
        assert_eq!(monitor.previous().len(), 1);
        assert!(!path.exists());

        // The next cycle diffs against the unsaved in-memory snapshot.
        assert_eq!(monitor.run_cycle().await.unwrap(), CycleOutcome::Unchanged);
    }

    #[tokio::test]
    async fn slow_collection_times_out_without_touching_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let catalog = ScriptedCatalog::default();
        *catalog.facts.lock().unwrap() = vec![PrivilegeFact::database("monitorado", "testdb")];

        let mut monitor = Monitor::new(PrivilegeCollector::new(&catalog), StateFile::new(&path), "monitorado")
            .with_cycle_timeout(Some(Duration::from_secs(1)));
        monitor.run_cycle().await.unwrap();
        let before = std::fs::read(&path).unwrap();
        let previous = monitor.previous().clone();

        catalog.facts.lock().unwrap().clear();
        catalog.stalled.store(true, Ordering::Relaxed);
        let err = monitor.run_cycle().await.unwrap_err();
        assert!(matches!(err, CollectError::Timeout { secs: 1 }));
        assert_eq!(monitor.previous(), &previous);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn state_of_only_false_entries_starts_a_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"DATABASE:monitorado:CONNECT:testdb": false}"#).unwrap();
        let catalog = ScriptedCatalog::default();
        *catalog.facts.lock().unwrap() = vec![PrivilegeFact::schema("monitorado", "USAGE", "public")];

        let mut monitor = Monitor::new(PrivilegeCollector::new(&catalog), StateFile::new(&path), "monitorado");
        assert!(monitor.previous().is_empty());
        assert_eq!(
            monitor.run_cycle().await.unwrap(),
            CycleOutcome::Baseline { privileges: 1 }
        );
    }

    #[tokio::test]
    async fn run_stops_when_flag_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ScriptedCatalog::default();
        let mut monitor = Monitor::new(
            PrivilegeCollector::new(&catalog),
            StateFile::new(dir.path().join("state.json")),
            "monitorado",
        );
        let stop = AtomicBool::new(true);
        monitor.run(Duration::from_secs(10), &stop).await;
        assert!(!dir.path().join("state.json").exists());
    }
}
