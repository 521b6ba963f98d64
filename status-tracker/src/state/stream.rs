use uuid::Uuid;

use crate::types::{
    IncompleteRunCause, JobType, MessageOrigin, ProtocolStreamStatus, RateLimitedMetadata,
    StreamRunState,
};

/// Last status reported by one side of a replication for a stream.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OriginStatus {
    Started,
    /// Also used while the stream is rate limited.
    Running,
    Complete,
    Incomplete(IncompleteRunCause),
}

impl OriginStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Incomplete(_))
    }

    pub fn as_protocol_status(&self) -> ProtocolStreamStatus {
        match self {
            Self::Started => ProtocolStreamStatus::Started,
            Self::Running => ProtocolStreamStatus::Running,
            Self::Complete => ProtocolStreamStatus::Complete,
            Self::Incomplete(_) => ProtocolStreamStatus::Incomplete,
        }
    }
}

/// Current status of a tracked stream run.
///
/// Each side of the replication is tracked separately. A side without any status yet is [`None`].
/// Once a side reaches a terminal status it keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentStreamStatus {
    pub source: Option<OriginStatus>,
    pub destination: Option<OriginStatus>,
    /// Identifier assigned by the status API, absent if creation failed.
    pub stream_id: Option<Uuid>,
    pub job_type: JobType,
    pub run_state: StreamRunState,
    /// Millis of the last transition applied to this stream.
    pub transitioned_at: i64,
    pub rate_limited_metadata: Option<RateLimitedMetadata>,
    /// Whether `COMPLETE` or `INCOMPLETE` was already sent to the status API.
    pub terminal_reported: bool,
}

impl CurrentStreamStatus {
    pub fn new(job_type: JobType, transitioned_at: i64) -> Self {
        Self {
            source: None,
            destination: None,
            stream_id: None,
            job_type,
            run_state: StreamRunState::Running,
            transitioned_at,
            rate_limited_metadata: None,
            terminal_reported: false,
        }
    }

    /// Sets the status of one side and returns whether it changed.
    ///
    /// Terminal statuses are never overwritten and internal origins have no side.
    pub fn set_origin_status(&mut self, origin: MessageOrigin, status: OriginStatus) -> bool {
        let side = match origin {
            MessageOrigin::Source => &mut self.source,
            MessageOrigin::Destination => &mut self.destination,
            MessageOrigin::Internal => return false,
        };

        match side {
            Some(current) if current.is_terminal() || *current == status => false,
            _ => {
                *side = Some(status);
                true
            }
        }
    }

    /// Returns `true` when both sides completed successfully.
    pub fn is_complete(&self) -> bool {
        self.source == Some(OriginStatus::Complete)
            && self.destination == Some(OriginStatus::Complete)
    }

    /// Returns `true` when both sides reached a terminal status.
    pub fn is_terminated(&self) -> bool {
        let terminal = |side: Option<OriginStatus>| side.is_some_and(|s| s.is_terminal());
        terminal(self.source) && terminal(self.destination)
    }

    /// Returns the status of the stream as a single protocol status.
    ///
    /// The destination side wins over the source side.
    pub fn current_status(&self) -> Option<ProtocolStreamStatus> {
        self.destination
            .or(self.source)
            .map(|status| status.as_protocol_status())
    }

    pub fn is_rate_limited(&self) -> bool {
        self.run_state == StreamRunState::RateLimited
    }
}
