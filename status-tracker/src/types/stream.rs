use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{ReplicationContext, ReplicationMessageEvent};

/// Name and optional namespace of a stream.
///
/// A descriptor with neither field set does not name a stream. Internal events use it to address
/// every stream of a replication run at once.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StreamDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl StreamDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.namespace.is_none()
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("<unnamed>");
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{name}"),
            None => write!(f, "{name}"),
        }
    }
}

/// Identifies one tracked stream within one attempt of one job.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct StreamStatusKey {
    pub stream_name: String,
    pub stream_namespace: Option<String>,
    pub workspace_id: Uuid,
    pub connection_id: Uuid,
    pub job_id: i64,
    pub attempt: u32,
}

impl StreamStatusKey {
    pub fn new(descriptor: &StreamDescriptor, context: &ReplicationContext) -> Option<Self> {
        let stream_name = descriptor.name.clone()?;

        Some(Self {
            stream_name,
            stream_namespace: descriptor.namespace.clone(),
            workspace_id: context.workspace_id,
            connection_id: context.connection_id,
            job_id: context.job_id,
            attempt: context.attempt,
        })
    }

    /// Derives the key of the stream an event refers to.
    ///
    /// Returns [`None`] when the event's descriptor carries no stream name.
    pub fn from_event(event: &ReplicationMessageEvent) -> Option<Self> {
        Self::new(
            &event.message.stream_descriptor,
            &event.replication_context,
        )
    }

    /// Returns `true` if this key belongs to the same workspace, connection, job and attempt as
    /// `context`.
    pub fn matches_run(&self, context: &ReplicationContext) -> bool {
        (
            self.workspace_id,
            self.connection_id,
            self.job_id,
            self.attempt,
        ) == context.run_ids()
    }

    pub fn stream_descriptor(&self) -> StreamDescriptor {
        StreamDescriptor {
            name: Some(self.stream_name.clone()),
            namespace: self.stream_namespace.clone(),
        }
    }
}

impl fmt::Display for StreamStatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (connection {}, job {}, attempt {})",
            self.stream_descriptor(),
            self.connection_id,
            self.job_id,
            self.attempt
        )
    }
}
