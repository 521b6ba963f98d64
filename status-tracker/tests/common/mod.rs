//! Shared helpers for the tracker integration tests.
//!
//! Provides builders for replication events with fixed identifiers and a status client whose
//! calls can be made to fail.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use status_tracker::bail;
use status_tracker::clients::memory::MemoryStreamStatusClient;
use status_tracker::clients::{
    StreamStatusClient, StreamStatusCreateRequest, StreamStatusRead, StreamStatusUpdateRequest,
};
use status_tracker::error::{ErrorKind, TrackerResult};
use status_tracker::types::{
    IncompleteRunCause, MessageOrigin, ProtocolStreamStatus, ReplicationContext,
    ReplicationMessageEvent, StreamDescriptor, StreamStatusKey, StreamStatusMessage,
    StreamStatusReason,
};
use uuid::Uuid;

pub const WORKSPACE_ID: Uuid = Uuid::from_u128(0x0a);
pub const CONNECTION_ID: Uuid = Uuid::from_u128(0x0b);
pub const JOB_ID: i64 = 42;
pub const ATTEMPT: u32 = 1;
pub const TIMESTAMP: i64 = 1_700_000_000_000;

pub fn orders() -> StreamDescriptor {
    StreamDescriptor::new("orders").with_namespace("public")
}

pub fn users() -> StreamDescriptor {
    StreamDescriptor::new("users").with_namespace("public")
}

pub fn context(is_reset: bool) -> ReplicationContext {
    run_context(is_reset, CONNECTION_ID, JOB_ID, ATTEMPT)
}

pub fn run_context(
    is_reset: bool,
    connection_id: Uuid,
    job_id: i64,
    attempt: u32,
) -> ReplicationContext {
    ReplicationContext {
        is_reset,
        connection_id,
        source_id: Uuid::from_u128(0x01),
        destination_id: Uuid::from_u128(0x02),
        job_id,
        attempt,
        workspace_id: WORKSPACE_ID,
        source_image: "airbyte/source-postgres:3.6.0".to_string(),
        destination_image: "airbyte/destination-bigquery:2.4.0".to_string(),
        source_definition_id: Uuid::from_u128(0x03),
        destination_definition_id: Uuid::from_u128(0x04),
    }
}

pub fn key(descriptor: &StreamDescriptor, context: &ReplicationContext) -> StreamStatusKey {
    StreamStatusKey::new(descriptor, context).unwrap()
}

pub fn event(
    origin: MessageOrigin,
    descriptor: &StreamDescriptor,
    status: ProtocolStreamStatus,
    timestamp: i64,
    context: &ReplicationContext,
) -> ReplicationMessageEvent {
    let message = StreamStatusMessage::new(descriptor.clone(), status, timestamp as f64);
    ReplicationMessageEvent::new(origin, message, context.clone())
}

pub fn started(
    origin: MessageOrigin,
    descriptor: &StreamDescriptor,
    context: &ReplicationContext,
) -> ReplicationMessageEvent {
    event(
        origin,
        descriptor,
        ProtocolStreamStatus::Started,
        TIMESTAMP,
        context,
    )
}

pub fn running(
    origin: MessageOrigin,
    descriptor: &StreamDescriptor,
    context: &ReplicationContext,
) -> ReplicationMessageEvent {
    event(
        origin,
        descriptor,
        ProtocolStreamStatus::Running,
        TIMESTAMP,
        context,
    )
}

pub fn rate_limited(
    origin: MessageOrigin,
    descriptor: &StreamDescriptor,
    quota_reset: i64,
    context: &ReplicationContext,
) -> ReplicationMessageEvent {
    let message = StreamStatusMessage::new(
        descriptor.clone(),
        ProtocolStreamStatus::Running,
        TIMESTAMP as f64,
    )
    .with_reason(StreamStatusReason::rate_limited(Some(quota_reset)));
    ReplicationMessageEvent::new(origin, message, context.clone())
}

pub fn complete(
    origin: MessageOrigin,
    descriptor: &StreamDescriptor,
    context: &ReplicationContext,
) -> ReplicationMessageEvent {
    event(
        origin,
        descriptor,
        ProtocolStreamStatus::Complete,
        TIMESTAMP,
        context,
    )
}

pub fn incomplete(
    origin: MessageOrigin,
    descriptor: &StreamDescriptor,
    cause: Option<IncompleteRunCause>,
    context: &ReplicationContext,
) -> ReplicationMessageEvent {
    let event = event(
        origin,
        descriptor,
        ProtocolStreamStatus::Incomplete,
        TIMESTAMP,
        context,
    );

    match cause {
        Some(cause) => event.with_incomplete_run_cause(cause),
        None => event,
    }
}

/// Internal event finalizing every stream of the run described by `context` as complete.
pub fn force_completion(context: &ReplicationContext) -> ReplicationMessageEvent {
    event(
        MessageOrigin::Internal,
        &StreamDescriptor::default(),
        ProtocolStreamStatus::Complete,
        TIMESTAMP,
        context,
    )
}

/// Status client delegating to a [`MemoryStreamStatusClient`] whose calls can be made to fail.
#[derive(Debug, Clone)]
pub struct FailingStatusClient {
    inner: MemoryStreamStatusClient,
    fail_creates: Arc<AtomicBool>,
    fail_updates: Arc<AtomicBool>,
    create_attempts: Arc<AtomicUsize>,
    update_attempts: Arc<AtomicUsize>,
}

impl FailingStatusClient {
    pub fn new() -> Self {
        Self {
            inner: MemoryStreamStatusClient::new(),
            fail_creates: Arc::new(AtomicBool::new(false)),
            fail_updates: Arc::new(AtomicBool::new(false)),
            create_attempts: Arc::new(AtomicUsize::new(0)),
            update_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn create_attempts(&self) -> usize {
        self.create_attempts.load(Ordering::SeqCst)
    }

    pub fn update_attempts(&self) -> usize {
        self.update_attempts.load(Ordering::SeqCst)
    }

    pub fn memory(&self) -> &MemoryStreamStatusClient {
        &self.inner
    }
}

impl StreamStatusClient for FailingStatusClient {
    async fn create_stream_status(
        &self,
        request: StreamStatusCreateRequest,
    ) -> TrackerResult<StreamStatusRead> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            bail!(
                ErrorKind::StatusApiUnavailable,
                "Status API is unreachable",
                "create"
            );
        }

        self.inner.create_stream_status(request).await
    }

    async fn update_stream_status(
        &self,
        request: StreamStatusUpdateRequest,
    ) -> TrackerResult<StreamStatusRead> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            bail!(
                ErrorKind::StatusApiUnavailable,
                "Status API is unreachable",
                "update"
            );
        }

        self.inner.update_stream_status(request).await
    }
}
