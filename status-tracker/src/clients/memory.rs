use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::bail;
use crate::clients::base::{
    StreamStatusClient, StreamStatusCreateRequest, StreamStatusRead, StreamStatusUpdateRequest,
};
use crate::error::{ErrorKind, TrackerResult};

#[derive(Debug)]
struct Inner {
    create_requests: Vec<StreamStatusCreateRequest>,
    update_requests: Vec<StreamStatusUpdateRequest>,
    statuses: HashMap<Uuid, StreamStatusRead>,
}

/// In-memory [`StreamStatusClient`] that keeps every request and the latest status per stream.
#[derive(Debug, Clone)]
pub struct MemoryStreamStatusClient {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStreamStatusClient {
    pub fn new() -> Self {
        let inner = Inner {
            create_requests: Vec::new(),
            update_requests: Vec::new(),
            statuses: HashMap::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn create_requests(&self) -> Vec<StreamStatusCreateRequest> {
        let inner = self.inner.lock().await;
        inner.create_requests.clone()
    }

    pub async fn update_requests(&self) -> Vec<StreamStatusUpdateRequest> {
        let inner = self.inner.lock().await;
        inner.update_requests.clone()
    }

    /// Returns the latest stored status of every created stream.
    pub async fn statuses(&self) -> Vec<StreamStatusRead> {
        let inner = self.inner.lock().await;
        inner.statuses.values().cloned().collect()
    }
}

impl Default for MemoryStreamStatusClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamStatusClient for MemoryStreamStatusClient {
    async fn create_stream_status(
        &self,
        request: StreamStatusCreateRequest,
    ) -> TrackerResult<StreamStatusRead> {
        let mut inner = self.inner.lock().await;
        info!("creating stream status:");
        info!("{:?}", request);

        let status = StreamStatusRead {
            attempt_number: request.attempt_number,
            connection_id: request.connection_id,
            id: Uuid::new_v4(),
            job_id: request.job_id,
            job_type: request.job_type,
            run_state: request.run_state,
            stream_name: request.stream_name.clone(),
            transitioned_at: request.transitioned_at,
            workspace_id: request.workspace_id,
            incomplete_run_cause: request.incomplete_run_cause,
            stream_namespace: request.stream_namespace.clone(),
            rate_limited_metadata: request.rate_limited_metadata,
        };

        inner.create_requests.push(request);
        inner.statuses.insert(status.id, status.clone());

        Ok(status)
    }

    async fn update_stream_status(
        &self,
        request: StreamStatusUpdateRequest,
    ) -> TrackerResult<StreamStatusRead> {
        let mut inner = self.inner.lock().await;
        info!("updating stream status {}:", request.id);
        info!("{:?}", request);

        if !inner.statuses.contains_key(&request.id) {
            bail!(
                ErrorKind::StatusApiRequestFailed,
                "Stream status not found",
                request.id
            );
        }

        let status = StreamStatusRead {
            attempt_number: request.attempt_number,
            connection_id: request.connection_id,
            id: request.id,
            job_id: request.job_id,
            job_type: request.job_type,
            run_state: request.run_state,
            stream_name: request.stream_name.clone(),
            transitioned_at: request.transitioned_at,
            workspace_id: request.workspace_id,
            incomplete_run_cause: request.incomplete_run_cause,
            stream_namespace: request.stream_namespace.clone(),
            rate_limited_metadata: request.rate_limited_metadata,
        };

        inner.update_requests.push(request);
        inner.statuses.insert(status.id, status.clone());

        Ok(status)
    }
}
