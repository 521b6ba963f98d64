use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

use crate::error::TrackerResult;
use crate::types::{IncompleteRunCause, JobType, RateLimitedMetadata, StreamRunState};

/// Body of a request recording the first status of a stream run.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StreamStatusCreateRequest {
    pub attempt_number: u32,
    pub connection_id: Uuid,
    pub job_id: i64,
    pub job_type: JobType,
    pub run_state: StreamRunState,
    pub stream_name: String,
    pub transitioned_at: i64,
    pub workspace_id: Uuid,
    pub incomplete_run_cause: Option<IncompleteRunCause>,
    pub stream_namespace: Option<String>,
    pub rate_limited_metadata: Option<RateLimitedMetadata>,
}

/// Body of a request recording a status transition of an already created stream status.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StreamStatusUpdateRequest {
    pub attempt_number: u32,
    pub connection_id: Uuid,
    pub job_id: i64,
    pub job_type: JobType,
    pub run_state: StreamRunState,
    pub stream_name: String,
    pub transitioned_at: i64,
    pub workspace_id: Uuid,
    /// Identifier returned when the stream status was created.
    pub id: Uuid,
    pub incomplete_run_cause: Option<IncompleteRunCause>,
    pub stream_namespace: Option<String>,
    pub rate_limited_metadata: Option<RateLimitedMetadata>,
}

/// Stream status as stored by the status API.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StreamStatusRead {
    pub attempt_number: u32,
    pub connection_id: Uuid,
    pub id: Uuid,
    pub job_id: i64,
    pub job_type: JobType,
    pub run_state: StreamRunState,
    pub stream_name: String,
    pub transitioned_at: i64,
    pub workspace_id: Uuid,
    pub incomplete_run_cause: Option<IncompleteRunCause>,
    pub stream_namespace: Option<String>,
    pub rate_limited_metadata: Option<RateLimitedMetadata>,
}

/// Remote API recording stream status transitions.
///
/// Implementations must be safe to call from multiple tasks. The tracker serializes its own calls
/// but several trackers may share one client.
pub trait StreamStatusClient {
    /// Records the first status of a stream run and returns the stored status with its identifier.
    fn create_stream_status(
        &self,
        request: StreamStatusCreateRequest,
    ) -> impl Future<Output = TrackerResult<StreamStatusRead>> + Send;

    /// Records a transition of the stream status identified by `request.id`.
    fn update_stream_status(
        &self,
        request: StreamStatusUpdateRequest,
    ) -> impl Future<Output = TrackerResult<StreamStatusRead>> + Send;
}
