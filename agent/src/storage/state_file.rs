//! JSON state file holding the last snapshot (`{"<key>": true, ...}`).
//! Writes go to a sibling temp file and are renamed into place.

use crate::error::StoreError;
use crate::facts::Snapshot;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("state"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read persisted state. `Ok(None)` when no state file exists yet.
    pub fn read(&self) -> Result<Option<Snapshot>, StoreError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Best-effort startup load: missing or unusable state yields an empty
    /// snapshot so the next cycle establishes a fresh baseline.
    pub fn load(&self) -> Snapshot {
        match self.read() {
            Ok(Some(snapshot)) => {
                info!(path = ?self.path, privileges = snapshot.len(), "loaded previous state");
                snapshot
            }
            Ok(None) => {
                info!(path = ?self.path, "no prior state found, starting fresh");
                Snapshot::new()
            }
            Err(e) => {
                warn!(error = %e, "ignoring unusable state file, starting fresh");
                Snapshot::new()
            }
        }
    }

    /// Replace the state file with `snapshot`.
    pub fn write(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Serialize)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, data)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|source| {
                let _ = std::fs::remove_file(&tmp);
                StoreError::Write {
                    path: self.path.clone(),
                    source,
                }
            })
    }
}
