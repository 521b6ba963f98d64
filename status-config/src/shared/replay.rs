use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Config;
use crate::shared::ValidationError;

/// Configuration for the stream status replayer.
///
/// The [`ReplayerConfig`] is typically deserialized from the `configuration` directory and passed
/// to the replayer at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplayerConfig {
    /// Where the events come from and what to do once they are exhausted.
    pub replay: ReplayConfig,
}

impl Config for ReplayerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["replay.connection_ids"];
}

impl ReplayerConfig {
    /// Validates the loaded [`ReplayerConfig`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.replay.validate()
    }
}

/// Replay input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplayConfig {
    /// Path of a newline-delimited JSON file, one replication message event per line.
    pub input_path: String,
    /// Whether to send a force-completion signal for every run seen once the input is exhausted.
    #[serde(default = "default_force_complete_on_eof")]
    pub force_complete_on_eof: bool,
    /// Connections whose events are replayed. Empty replays every connection.
    #[serde(default)]
    pub connection_ids: Vec<String>,
}

fn default_force_complete_on_eof() -> bool {
    true
}

impl ReplayConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.input_path.trim().is_empty() {
            return Err(ValidationError::InvalidInput(
                "input_path cannot be empty".to_string(),
            ));
        }

        if self.connection_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ValidationError::InvalidInput(
                "connection_ids cannot contain empty ids".to_string(),
            ));
        }

        let path = Path::new(&self.input_path);
        if path.is_dir() {
            return Err(ValidationError::InvalidInput(format!(
                "input_path must point to a file, got directory {}",
                self.input_path
            )));
        }

        Ok(())
    }

    /// Returns whether events of `connection_id` should be replayed.
    pub fn includes_connection(&self, connection_id: &str) -> bool {
        self.connection_ids.is_empty()
            || self
                .connection_ids
                .iter()
                .any(|id| id.trim().eq_ignore_ascii_case(connection_id))
    }

    /// Returns the connection id when exactly one connection is replayed.
    pub fn single_connection_id(&self) -> Option<&str> {
        match self.connection_ids.as_slice() {
            [id] => Some(id.trim()),
            _ => None,
        }
    }
}
