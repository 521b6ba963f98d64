use anyhow::Context;
use status_config::shared::{ReplayConfig, ReplayerConfig};
use status_tracker::bail;
use status_tracker::clients::memory::MemoryStreamStatusClient;
use status_tracker::clients::{StreamStatusClient, StreamStatusRead};
use status_tracker::error::{ErrorKind, TrackerResult};
use status_tracker::tracker::StreamStatusTracker;
use status_tracker::types::{
    MessageOrigin, ProtocolStreamStatus, ReplicationContext, ReplicationMessageEvent,
    StreamDescriptor, StreamRunState, StreamStatusMessage,
};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Counters collected while replaying an input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub skipped: usize,
    /// Events of connections excluded by the configuration.
    pub filtered: usize,
    pub runs: usize,
}

/// A replication run seen in the input along with the latest emission time of its events.
#[derive(Debug)]
struct SeenRun {
    context: ReplicationContext,
    last_emitted_at: f64,
}

/// Starts the replayer with the provided configuration.
///
/// Feeds every event of the configured input through a tracker backed by an in-memory status
/// client and logs what the status API would have received.
pub async fn start_replayer_with_config(replayer_config: ReplayerConfig) -> anyhow::Result<()> {
    info!("starting stream status replayer");

    log_config(&replayer_config.replay);

    let client = MemoryStreamStatusClient::new();
    let tracker = StreamStatusTracker::new(client.clone());

    let summary = replay_file(&replayer_config.replay, &tracker).await?;

    info!(
        events = summary.events,
        skipped = summary.skipped,
        filtered = summary.filtered,
        runs = summary.runs,
        creates = client.create_requests().await.len(),
        updates = client.update_requests().await.len(),
        tracked_streams = tracker.tracked_streams_count().await,
        "stream status replay completed"
    );

    for (run_state, streams) in count_run_states(&client.statuses().await) {
        info!(%run_state, streams, "final stream statuses");
    }

    Ok(())
}

fn log_config(config: &ReplayConfig) {
    debug!(
        input_path = config.input_path,
        force_complete_on_eof = config.force_complete_on_eof,
        connection_ids = ?config.connection_ids,
        "replay config"
    );
}

async fn replay_file<C>(
    config: &ReplayConfig,
    tracker: &StreamStatusTracker<C>,
) -> anyhow::Result<ReplaySummary>
where
    C: StreamStatusClient + Send + Sync,
{
    let file = File::open(&config.input_path)
        .await
        .with_context(|| format!("failed to open replay input {}", config.input_path))?;

    replay(BufReader::new(file), tracker, config).await
}

/// Tracks every newline-delimited event read from `reader`.
///
/// Blank lines are ignored, malformed lines are logged and skipped and events of connections not
/// selected by `config` are dropped. When `config.force_complete_on_eof` is set, every run seen is
/// force-completed once the input is exhausted.
pub async fn replay<R, C>(
    reader: R,
    tracker: &StreamStatusTracker<C>,
    config: &ReplayConfig,
) -> anyhow::Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
    C: StreamStatusClient + Send + Sync,
{
    let mut summary = ReplaySummary::default();
    let mut runs: Vec<SeenRun> = Vec::new();

    let mut lines = reader.lines();
    let mut line_number = 0;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(err) => {
                warn!("skipping malformed event on line {}: {}", line_number, err);
                summary.skipped += 1;
                continue;
            }
        };

        let connection_id = event.replication_context.connection_id.to_string();
        if !config.includes_connection(&connection_id) {
            summary.filtered += 1;
            continue;
        }

        remember_run(&mut runs, &event);
        tracker.track(&event).await;
        summary.events += 1;
    }

    summary.runs = runs.len();

    if config.force_complete_on_eof {
        for run in runs {
            info!(
                connection_id = %run.context.connection_id,
                job_id = run.context.job_id,
                attempt = run.context.attempt,
                "force completing replication run"
            );
            tracker
                .track(&force_completion_event(run.context, run.last_emitted_at))
                .await;
        }
    }

    Ok(summary)
}

fn parse_event(line: &str) -> TrackerResult<ReplicationMessageEvent> {
    let event: ReplicationMessageEvent = serde_json::from_str(line)?;

    if !event.message.emitted_at.is_finite() {
        bail!(
            ErrorKind::InvalidData,
            "Event emission time is not a finite number",
            event.message.emitted_at
        );
    }

    if event.origin != MessageOrigin::Internal && event.message.stream_descriptor.name.is_none() {
        bail!(
            ErrorKind::InvalidEvent,
            "Connector event without a stream name",
            event.origin
        );
    }

    Ok(event)
}

fn remember_run(runs: &mut Vec<SeenRun>, event: &ReplicationMessageEvent) {
    let context = &event.replication_context;
    let emitted_at = event.message.emitted_at;

    let seen = runs
        .iter_mut()
        .find(|run| run.context.is_same_run(context));

    match seen {
        Some(run) => run.last_emitted_at = run.last_emitted_at.max(emitted_at),
        None => runs.push(SeenRun {
            context: context.clone(),
            last_emitted_at: emitted_at,
        }),
    }
}

/// Counts the streams of every run state, in state order, leaving out states no stream is in.
fn count_run_states(statuses: &[StreamStatusRead]) -> Vec<(StreamRunState, usize)> {
    [
        StreamRunState::Running,
        StreamRunState::RateLimited,
        StreamRunState::Complete,
        StreamRunState::Incomplete,
    ]
    .into_iter()
    .map(|run_state| {
        let streams = statuses
            .iter()
            .filter(|status| status.run_state == run_state)
            .count();
        (run_state, streams)
    })
    .filter(|(_, streams)| *streams > 0)
    .collect()
}

fn force_completion_event(context: ReplicationContext, emitted_at: f64) -> ReplicationMessageEvent {
    let message = StreamStatusMessage::new(
        StreamDescriptor::default(),
        ProtocolStreamStatus::Complete,
        emitted_at,
    );

    ReplicationMessageEvent::new(MessageOrigin::Internal, message, context)
}
