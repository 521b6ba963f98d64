use serde::{Deserialize, Serialize};
use std::fmt;

/// Run state of a stream as recorded by the status API.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamRunState {
    Running,
    RateLimited,
    Complete,
    Incomplete,
}

impl StreamRunState {
    /// Returns `true` for states after which no further transitions are reported.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Incomplete)
    }
}

impl fmt::Display for StreamRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Complete => write!(f, "complete"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// Why a stream run ended without completing.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncompleteRunCause {
    #[default]
    Failed,
    Canceled,
}

/// Kind of job a stream run belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    Sync,
    Reset,
}

/// Extra information attached to a rate-limited status.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RateLimitedMetadata {
    /// Epoch millis at which the source's quota is expected to reset, if known.
    pub quota_reset: Option<i64>,
}
