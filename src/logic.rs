use tracing::{info, warn};

use crate::command::{CommandError, CommandResult};
use crate::model::Model;
use crate::parser::{self, ParseError};
use crate::storage::{Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum LogicError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Command(#[from] CommandError),
    /// The mutation stays applied in memory; only the save failed.
    #[error("Your changes could not be saved: {0}")]
    Storage(#[from] StorageError),
}

/// Execution orchestrator: parses one input line, executes it against the
/// model, persists the outcome. Strictly one line at a time; a failure at any
/// stage becomes a single user-facing message and never ends the session.
pub struct Logic {
    model: Model,
    storage: Storage,
}

impl Logic {
    /// Opens a session. An unreadable or malformed data file degrades to an
    /// empty model with a warning; only a later save can fail the user.
    pub fn new(storage: Storage) -> Self {
        let persons = match storage.read_roster() {
            Ok(found) => found.unwrap_or_default(),
            Err(error) => {
                warn!(%error, "could not read roster, starting with an empty one");
                Vec::new()
            }
        };
        let timeslots = match storage.read_timeslots() {
            Ok(found) => found.unwrap_or_default(),
            Err(error) => {
                warn!(%error, "could not read timeslots, starting with none");
                Default::default()
            }
        };
        Self {
            model: Model::load(persons, timeslots),
            storage,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn execute(&mut self, line: &str) -> Result<CommandResult, LogicError> {
        let command = parser::parse_command(line).map_err(|error| {
            warn!(input = line.trim(), %error, "parse failed");
            error
        })?;
        let result = command.execute(&mut self.model).map_err(|error| {
            warn!(input = line.trim(), %error, "command failed");
            error
        })?;
        self.storage.save_roster(self.model.persons())?;
        self.storage.save_timeslots(&self.model.timeslots)?;
        info!(input = line.trim(), "executed");
        Ok(result)
    }
}
