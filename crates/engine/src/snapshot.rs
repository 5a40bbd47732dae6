//! Local snapshot of the store, used as the only persistence when no remote
//! is configured.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Batch, ResultEngine, User};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotState {
    pub user: Option<User>,
    #[serde(default)]
    pub batches: Vec<Batch>,
}

#[derive(Clone, Debug)]
pub struct LocalSnapshot {
    path: PathBuf,
}

impl LocalSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot; a missing file is an empty state.
    pub fn load(&self) -> ResultEngine<SnapshotState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(SnapshotState::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, state: &SnapshotState) -> ResultEngine<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}
