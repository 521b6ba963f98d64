use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{IncompleteRunCause, JobType, RateLimitedMetadata, StreamDescriptor};

/// Component of a replication that emitted an event.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageOrigin {
    /// The source connector.
    Source,
    /// The destination connector.
    Destination,
    /// The replication orchestrator itself.
    Internal,
}

impl fmt::Display for MessageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Stream status as reported by a connector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolStreamStatus {
    Started,
    Running,
    Complete,
    Incomplete,
}

impl fmt::Display for ProtocolStreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Running => write!(f, "running"),
            Self::Complete => write!(f, "complete"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatusReasonType {
    RateLimited,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RateLimitedReason {
    #[serde(default)]
    pub quota_reset: Option<i64>,
}

/// Additional context attached to a status message.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StreamStatusReason {
    #[serde(rename = "type")]
    pub reason_type: StreamStatusReasonType,
    #[serde(default)]
    pub rate_limited: Option<RateLimitedReason>,
}

impl StreamStatusReason {
    pub fn rate_limited(quota_reset: Option<i64>) -> Self {
        Self {
            reason_type: StreamStatusReasonType::RateLimited,
            rate_limited: Some(RateLimitedReason { quota_reset }),
        }
    }
}

/// A stream status trace message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStatusMessage {
    pub stream_descriptor: StreamDescriptor,
    pub status: ProtocolStreamStatus,
    /// Emission time in epoch millis.
    pub emitted_at: f64,
    #[serde(default)]
    pub reasons: Vec<StreamStatusReason>,
}

impl StreamStatusMessage {
    pub fn new(
        stream_descriptor: StreamDescriptor,
        status: ProtocolStreamStatus,
        emitted_at: f64,
    ) -> Self {
        Self {
            stream_descriptor,
            status,
            emitted_at,
            reasons: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: StreamStatusReason) -> Self {
        self.reasons.push(reason);
        self
    }

    /// Returns the emission time truncated to whole milliseconds.
    pub fn transitioned_at_ms(&self) -> i64 {
        self.emitted_at as i64
    }

    /// Returns the rate-limit metadata if this is a rate-limited `RUNNING` message.
    pub fn rate_limited_metadata(&self) -> Option<RateLimitedMetadata> {
        if self.status != ProtocolStreamStatus::Running {
            return None;
        }

        self.reasons
            .iter()
            .find(|reason| reason.reason_type == StreamStatusReasonType::RateLimited)
            .map(|reason| RateLimitedMetadata {
                quota_reset: reason.rate_limited.and_then(|r| r.quota_reset),
            })
    }
}

/// Identifiers and metadata of the replication run an event belongs to.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ReplicationContext {
    pub is_reset: bool,
    pub connection_id: Uuid,
    pub source_id: Uuid,
    pub destination_id: Uuid,
    pub job_id: i64,
    pub attempt: u32,
    pub workspace_id: Uuid,
    #[serde(default)]
    pub source_image: String,
    #[serde(default)]
    pub destination_image: String,
    pub source_definition_id: Uuid,
    pub destination_definition_id: Uuid,
}

impl ReplicationContext {
    pub fn job_type(&self) -> JobType {
        if self.is_reset {
            JobType::Reset
        } else {
            JobType::Sync
        }
    }

    /// Workspace, connection, job and attempt identifying the run.
    pub fn run_ids(&self) -> (Uuid, Uuid, i64, u32) {
        (
            self.workspace_id,
            self.connection_id,
            self.job_id,
            self.attempt,
        )
    }

    /// Returns `true` if both contexts belong to the same workspace, connection, job and attempt.
    pub fn is_same_run(&self, other: &ReplicationContext) -> bool {
        self.run_ids() == other.run_ids()
    }
}

/// A stream status message together with its origin and replication run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationMessageEvent {
    pub origin: MessageOrigin,
    pub message: StreamStatusMessage,
    pub replication_context: ReplicationContext,
    /// Cause of an `INCOMPLETE` status. Treated as [`IncompleteRunCause::Failed`] when absent.
    #[serde(default)]
    pub incomplete_run_cause: Option<IncompleteRunCause>,
}

impl ReplicationMessageEvent {
    pub fn new(
        origin: MessageOrigin,
        message: StreamStatusMessage,
        replication_context: ReplicationContext,
    ) -> Self {
        Self {
            origin,
            message,
            replication_context,
            incomplete_run_cause: None,
        }
    }

    pub fn with_incomplete_run_cause(mut self, cause: IncompleteRunCause) -> Self {
        self.incomplete_run_cause = Some(cause);
        self
    }

    pub fn incomplete_run_cause(&self) -> IncompleteRunCause {
        self.incomplete_run_cause.unwrap_or_default()
    }

    /// Returns `true` for internal events addressing every stream of a run.
    pub fn is_run_wide(&self) -> bool {
        self.origin == MessageOrigin::Internal && self.message.stream_descriptor.is_empty()
    }
}
