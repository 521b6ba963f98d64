use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, warn};

use crate::clients::{StreamStatusClient, StreamStatusCreateRequest, StreamStatusUpdateRequest};
use crate::state::{CurrentStreamStatus, OriginStatus};
use crate::types::{
    IncompleteRunCause, MessageOrigin, ProtocolStreamStatus, ReplicationContext,
    ReplicationMessageEvent, StreamDescriptor, StreamRunState, StreamStatusKey,
};

#[derive(Debug)]
struct Inner {
    statuses: HashMap<StreamStatusKey, CurrentStreamStatus>,
    rate_limited: HashSet<StreamStatusKey>,
}

/// Tracks the status of every stream of running replications and reports transitions to a
/// [`StreamStatusClient`].
///
/// Cloning the tracker is cheap and every clone shares the same state. Events are applied one at
/// a time: a call to [`StreamStatusTracker::track`] holds the state lock until the status API
/// answered, so a stream status is created at most once even when `STARTED` events race.
#[derive(Debug, Clone)]
pub struct StreamStatusTracker<C> {
    client: C,
    inner: Arc<Mutex<Inner>>,
}

impl<C> StreamStatusTracker<C>
where
    C: StreamStatusClient + Send + Sync,
{
    pub fn new(client: C) -> Self {
        let inner = Inner {
            statuses: HashMap::new(),
            rate_limited: HashSet::new(),
        };

        Self {
            client,
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Applies a replication event to the tracked state, reporting any resulting transition.
    ///
    /// Failures of the status API are logged and never returned, local state advances regardless.
    pub async fn track(&self, event: &ReplicationMessageEvent) {
        let context = &event.replication_context;
        let span = tracing::info_span!(
            "track_stream_status",
            connection_id = %context.connection_id,
            job_id = context.job_id,
            attempt = context.attempt,
            origin = %event.origin,
            status = %event.message.status,
        );

        async {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;

            if event.origin == MessageOrigin::Internal {
                self.handle_internal(inner, event).await;
                return;
            }

            let Some(key) = StreamStatusKey::from_event(event) else {
                warn!(
                    "ignoring {} stream status event without a stream name",
                    event.message.status
                );
                return;
            };

            match event.message.status {
                ProtocolStreamStatus::Started => self.handle_started(inner, key, event).await,
                ProtocolStreamStatus::Running => self.handle_running(inner, key, event).await,
                ProtocolStreamStatus::Complete => self.handle_complete(inner, key, event).await,
                ProtocolStreamStatus::Incomplete => {
                    self.handle_incomplete(inner, key, event).await
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Returns the simplified status of a stream, [`None`] if it is not tracked.
    pub async fn get_stream_status(&self, key: &StreamStatusKey) -> Option<ProtocolStreamStatus> {
        let inner = self.inner.lock().await;

        inner
            .statuses
            .get(key)
            .and_then(|status| status.current_status())
    }

    pub async fn get_current_stream_status(
        &self,
        key: &StreamStatusKey,
    ) -> Option<CurrentStreamStatus> {
        let inner = self.inner.lock().await;

        inner.statuses.get(key).cloned()
    }

    /// Returns the descriptors of all streams currently rate limited, across all runs.
    pub async fn get_streams_in_rate_limited_status(&self) -> HashSet<StreamDescriptor> {
        let inner = self.inner.lock().await;

        inner
            .rate_limited
            .iter()
            .map(|key| key.stream_descriptor())
            .collect()
    }

    pub async fn tracked_streams_count(&self) -> usize {
        let inner = self.inner.lock().await;

        inner.statuses.len()
    }

    async fn handle_started(
        &self,
        inner: &mut Inner,
        key: StreamStatusKey,
        event: &ReplicationMessageEvent,
    ) {
        if inner.statuses.contains_key(&key) {
            debug!("stream {} was already started", key);
            return;
        }

        let context = &event.replication_context;
        let mut status = CurrentStreamStatus::new(
            context.job_type(),
            event.message.transitioned_at_ms(),
        );
        status.set_origin_status(event.origin, OriginStatus::Started);

        let request = StreamStatusCreateRequest {
            attempt_number: key.attempt,
            connection_id: key.connection_id,
            job_id: key.job_id,
            job_type: status.job_type,
            run_state: StreamRunState::Running,
            stream_name: key.stream_name.clone(),
            transitioned_at: status.transitioned_at,
            workspace_id: key.workspace_id,
            incomplete_run_cause: None,
            stream_namespace: key.stream_namespace.clone(),
            rate_limited_metadata: None,
        };

        match self.client.create_stream_status(request).await {
            Ok(created) => {
                info!("created stream status {} for stream {}", created.id, key);
                status.stream_id = Some(created.id);
            }
            Err(err) => {
                error!("failed to create stream status for stream {}: {}", key, err);
            }
        }

        inner.statuses.insert(key, status);
    }

    async fn handle_running(
        &self,
        inner: &mut Inner,
        key: StreamStatusKey,
        event: &ReplicationMessageEvent,
    ) {
        let Some(status) = inner.statuses.get_mut(&key) else {
            debug!("ignoring running status for untracked stream {}", key);
            return;
        };

        let side_changed = status.set_origin_status(event.origin, OriginStatus::Running);
        if status.terminal_reported {
            debug!("stream {} already ended, ignoring running status", key);
            return;
        }

        let transitioned_at = event.message.transitioned_at_ms();
        let same_time = status.transitioned_at == transitioned_at;

        match event.message.rate_limited_metadata() {
            Some(metadata) => {
                let duplicate = !side_changed
                    && same_time
                    && status.is_rate_limited()
                    && status.rate_limited_metadata == Some(metadata);

                status.run_state = StreamRunState::RateLimited;
                status.rate_limited_metadata = Some(metadata);
                status.transitioned_at = transitioned_at;
                inner.rate_limited.insert(key.clone());

                if duplicate {
                    debug!("ignoring duplicate rate limited status for stream {}", key);
                    return;
                }
            }
            None => {
                let duplicate = !side_changed
                    && same_time
                    && status.run_state == StreamRunState::Running;

                status.run_state = StreamRunState::Running;
                status.rate_limited_metadata = None;
                status.transitioned_at = transitioned_at;
                inner.rate_limited.remove(&key);

                if duplicate {
                    debug!("ignoring duplicate running status for stream {}", key);
                    return;
                }
            }
        }

        self.send_update(&key, status, None).await;
    }

    async fn handle_complete(
        &self,
        inner: &mut Inner,
        key: StreamStatusKey,
        event: &ReplicationMessageEvent,
    ) {
        let Some(status) = inner.statuses.get_mut(&key) else {
            debug!("ignoring complete status for untracked stream {}", key);
            return;
        };

        status.set_origin_status(event.origin, OriginStatus::Complete);
        if status.terminal_reported {
            debug!("stream {} already ended, recorded {} completion", key, event.origin);
            return;
        }

        if !status.is_complete() {
            debug!(
                "stream {} completed on the {} side only, waiting for the other side",
                key, event.origin
            );
            return;
        }

        status.run_state = StreamRunState::Complete;
        status.rate_limited_metadata = None;
        status.transitioned_at = event.message.transitioned_at_ms();
        status.terminal_reported = true;
        inner.rate_limited.remove(&key);

        self.send_update(&key, status, None).await;
    }

    async fn handle_incomplete(
        &self,
        inner: &mut Inner,
        key: StreamStatusKey,
        event: &ReplicationMessageEvent,
    ) {
        let Some(status) = inner.statuses.get_mut(&key) else {
            debug!("ignoring incomplete status for untracked stream {}", key);
            return;
        };

        let cause = event.incomplete_run_cause();
        status.set_origin_status(event.origin, OriginStatus::Incomplete(cause));
        if status.terminal_reported {
            debug!("stream {} already ended, recorded {} failure", key, event.origin);
            return;
        }

        status.run_state = StreamRunState::Incomplete;
        status.rate_limited_metadata = None;
        status.transitioned_at = event.message.transitioned_at_ms();
        status.terminal_reported = true;
        inner.rate_limited.remove(&key);

        self.send_update(&key, status, Some(cause)).await;
    }

    async fn handle_internal(&self, inner: &mut Inner, event: &ReplicationMessageEvent) {
        let (run_state, cause) = match event.message.status {
            ProtocolStreamStatus::Complete => (StreamRunState::Complete, None),
            ProtocolStreamStatus::Incomplete => (
                StreamRunState::Incomplete,
                Some(event.incomplete_run_cause()),
            ),
            ProtocolStreamStatus::Started | ProtocolStreamStatus::Running => {
                debug!("ignoring internal {} status", event.message.status);
                return;
            }
        };
        let transitioned_at = event.message.transitioned_at_ms();

        if event.is_run_wide() {
            let context = &event.replication_context;
            let keys = Self::run_keys(inner, context);
            info!(
                "finalizing {} tracked streams of connection {} as {}",
                keys.len(),
                context.connection_id,
                run_state
            );

            for key in keys {
                self.finalize(inner, key, run_state, cause, transitioned_at)
                    .await;
            }

            return;
        }

        let Some(key) = StreamStatusKey::from_event(event) else {
            warn!("ignoring internal stream status event without a stream name");
            return;
        };

        self.finalize(inner, key, run_state, cause, transitioned_at)
            .await;
    }

    fn run_keys(inner: &Inner, context: &ReplicationContext) -> Vec<StreamStatusKey> {
        inner
            .statuses
            .keys()
            .filter(|key| key.matches_run(context))
            .cloned()
            .collect()
    }

    /// Stops tracking a stream, first reporting `run_state` if no terminal state was reported yet.
    async fn finalize(
        &self,
        inner: &mut Inner,
        key: StreamStatusKey,
        run_state: StreamRunState,
        cause: Option<IncompleteRunCause>,
        transitioned_at: i64,
    ) {
        inner.rate_limited.remove(&key);
        let Some(mut status) = inner.statuses.remove(&key) else {
            debug!("no tracked stream {} to finalize", key);
            return;
        };

        if status.terminal_reported {
            debug!("stream {} already ended, clearing it", key);
            return;
        }

        status.run_state = run_state;
        status.rate_limited_metadata = None;
        status.transitioned_at = transitioned_at;
        status.terminal_reported = true;

        self.send_update(&key, &status, cause).await;
    }

    async fn send_update(
        &self,
        key: &StreamStatusKey,
        status: &CurrentStreamStatus,
        incomplete_run_cause: Option<IncompleteRunCause>,
    ) {
        let Some(stream_id) = status.stream_id else {
            warn!(
                "skipping {} update of stream {}, its stream status was never created",
                status.run_state, key
            );
            return;
        };

        let request = StreamStatusUpdateRequest {
            attempt_number: key.attempt,
            connection_id: key.connection_id,
            job_id: key.job_id,
            job_type: status.job_type,
            run_state: status.run_state,
            stream_name: key.stream_name.clone(),
            transitioned_at: status.transitioned_at,
            workspace_id: key.workspace_id,
            id: stream_id,
            incomplete_run_cause,
            stream_namespace: key.stream_namespace.clone(),
            rate_limited_metadata: status.rate_limited_metadata,
        };

        if let Err(err) = self.client.update_stream_status(request).await {
            error!(
                "failed to update stream status of stream {} to {}: {}",
                key, status.run_state, err
            );
        }
    }
}
