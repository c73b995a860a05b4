//! One JSON state file per agent under a directory.
use idlepace_core::{AgentScheduleState, ScheduleStore, StateError};
use log::warn;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open `dir`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StateError> {
        let dir = dir.into();
        if !dir.exists() {
            warn!(
                "State directory {} does not exist, creating it",
                dir.display()
            );
            fs::create_dir_all(&dir).map_err(|source| StateError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self::new(dir))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, agent: &str) -> PathBuf {
        self.dir.join(format!("{agent}.json"))
    }
}

impl ScheduleStore for JsonFileStore {
    fn load(&self, agent: &str) -> Result<Option<AgentScheduleState>, StateError> {
        let path = self.path_for(agent);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateError::Io { path, source }),
        };
        let state: AgentScheduleState = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(source) => return Err(StateError::Malformed { path, source }),
        };
        if let Err(source) = state.validate() {
            return Err(StateError::Invalid { path, source });
        }
        Ok(Some(state))
    }

    fn save(&self, agent: &str, state: &AgentScheduleState) -> Result<(), StateError> {
        let path = self.path_for(agent);
        let tmp = self.dir.join(format!(".{agent}.json.tmp"));
        let json = serde_json::to_string_pretty(state).map_err(|source| StateError::Malformed {
            path: path.clone(),
            source,
        })?;
        write_synced(&tmp, json.as_bytes()).map_err(|source| StateError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StateError::Io { path, source })
    }
}

/// Write `contents` and flush it to disk before returning.
fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
