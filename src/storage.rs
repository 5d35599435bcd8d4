use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::person::Person;
use crate::model::timeslot::TimeslotCollection;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Insufficient permissions to access {path}.")]
    PermissionDenied { path: PathBuf },
    #[error("Could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not in the expected format: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON persistence port: `roster.json` and `timeslots.json` under one data
/// directory. Absent files read as `None`, never as an error.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn roster_path(&self) -> PathBuf {
        self.data_dir.join("roster.json")
    }

    fn timeslots_path(&self) -> PathBuf {
        self.data_dir.join("timeslots.json")
    }

    pub fn read_roster(&self) -> Result<Option<Vec<Person>>, StorageError> {
        self.read(&self.roster_path())
    }

    pub fn save_roster(&self, persons: &[Person]) -> Result<(), StorageError> {
        self.save(&self.roster_path(), &persons)
    }

    pub fn read_timeslots(&self) -> Result<Option<TimeslotCollection>, StorageError> {
        self.read(&self.timeslots_path())
    }

    pub fn save_timeslots(&self, timeslots: &TimeslotCollection) -> Result<(), StorageError> {
        self.save(&self.timeslots_path(), timeslots)
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StorageError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no data file yet");
                return Ok(None);
            }
            Err(error) => return Err(read_write_error(path, error)),
        };
        let value = serde_json::from_str(&text).map_err(|source| StorageError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(value))
    }

    fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|error| read_write_error(&self.data_dir, error))?;
        let text = serde_json::to_string_pretty(value).map_err(|source| StorageError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(|error| read_write_error(path, error))?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }
}

fn read_write_error(path: &Path, error: io::Error) -> StorageError {
    if error.kind() == io::ErrorKind::PermissionDenied {
        StorageError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        StorageError::Io {
            path: path.to_path_buf(),
            source: error,
        }
    }
}
