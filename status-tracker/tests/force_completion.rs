use status_telemetry::init_test_tracing;
use status_tracker::clients::memory::MemoryStreamStatusClient;
use status_tracker::tracker::StreamStatusTracker;
use status_tracker::types::{
    IncompleteRunCause, MessageOrigin, ProtocolStreamStatus, StreamDescriptor, StreamRunState,
};
use uuid::Uuid;

use crate::common::*;

mod common;

fn new_tracker() -> (
    StreamStatusTracker<MemoryStreamStatusClient>,
    MemoryStreamStatusClient,
) {
    let client = MemoryStreamStatusClient::new();
    (StreamStatusTracker::new(client.clone()), client)
}

#[tokio::test]
async fn force_completion_completes_running_streams() {
    init_test_tracing();

    for is_reset in [false, true] {
        let (tracker, client) = new_tracker();
        let context = context(is_reset);

        tracker
            .track(&started(MessageOrigin::Source, &orders(), &context))
            .await;
        tracker
            .track(&running(MessageOrigin::Source, &orders(), &context))
            .await;
        tracker.track(&force_completion(&context)).await;

        assert_eq!(tracker.get_stream_status(&key(&orders(), &context)).await, None);
        assert_eq!(tracker.tracked_streams_count().await, 0);

        let updates = client.update_requests().await;
        assert_eq!(updates.len(), 2);
        let last = &updates[1];
        assert_eq!(last.run_state, StreamRunState::Complete);
        assert_eq!(last.stream_name, "orders");
        assert_eq!(last.transitioned_at, TIMESTAMP);
        assert_eq!(last.incomplete_run_cause, None);
    }
}

#[tokio::test]
async fn force_completion_completes_partially_complete_streams() {
    init_test_tracing();
    let (tracker, client) = new_tracker();
    let context = context(false);

    tracker
        .track(&started(MessageOrigin::Source, &orders(), &context))
        .await;
    tracker
        .track(&running(MessageOrigin::Source, &orders(), &context))
        .await;
    tracker
        .track(&complete(MessageOrigin::Source, &orders(), &context))
        .await;

    let key = key(&orders(), &context);
    assert!(!tracker.get_current_stream_status(&key).await.unwrap().is_complete());

    tracker.track(&force_completion(&context)).await;

    assert_eq!(tracker.get_stream_status(&key).await, None);
    let updates = client.update_requests().await;
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1].run_state, StreamRunState::Complete);
}

#[tokio::test]
async fn force_completion_does_not_resend_terminal_streams() {
    init_test_tracing();

    for source_failed in [false, true] {
        let (tracker, client) = new_tracker();
        let context = context(false);

        tracker
            .track(&started(MessageOrigin::Source, &orders(), &context))
            .await;
        tracker
            .track(&running(MessageOrigin::Source, &orders(), &context))
            .await;
        if source_failed {
            tracker
                .track(&incomplete(MessageOrigin::Source, &orders(), None, &context))
                .await;
        } else {
            tracker
                .track(&complete(MessageOrigin::Source, &orders(), &context))
                .await;
        }
        tracker
            .track(&complete(MessageOrigin::Destination, &orders(), &context))
            .await;

        let reported = client.update_requests().await.len();
        assert_eq!(reported, 2);

        tracker.track(&force_completion(&context)).await;

        assert_eq!(tracker.get_stream_status(&key(&orders(), &context)).await, None);
        assert_eq!(client.update_requests().await.len(), reported);
    }
}

#[tokio::test]
async fn force_completion_only_touches_its_run() {
    init_test_tracing();
    let (tracker, client) = new_tracker();
    let tracked = run_context(false, Uuid::from_u128(0xff), 2, 2);
    let other = context(false);

    tracker
        .track(&started(MessageOrigin::Source, &orders(), &tracked))
        .await;
    tracker
        .track(&running(MessageOrigin::Source, &orders(), &tracked))
        .await;
    tracker.track(&force_completion(&other)).await;

    assert_eq!(
        tracker.get_stream_status(&key(&orders(), &tracked)).await,
        Some(ProtocolStreamStatus::Running)
    );
    assert_eq!(client.update_requests().await.len(), 1);
}

#[tokio::test]
async fn force_completion_finalizes_every_stream_of_the_run() {
    init_test_tracing();
    let (tracker, client) = new_tracker();
    let context = context(false);
    let next_attempt = run_context(false, CONNECTION_ID, JOB_ID, ATTEMPT + 1);

    for descriptor in [orders(), users()] {
        tracker
            .track(&started(MessageOrigin::Source, &descriptor, &context))
            .await;
    }
    tracker
        .track(&rate_limited(
            MessageOrigin::Source,
            &users(),
            TIMESTAMP + 60_000,
            &context,
        ))
        .await;
    tracker
        .track(&started(MessageOrigin::Source, &orders(), &next_attempt))
        .await;

    tracker.track(&force_completion(&context)).await;

    assert_eq!(tracker.tracked_streams_count().await, 1);
    assert!(tracker.get_streams_in_rate_limited_status().await.is_empty());
    assert_eq!(
        tracker.get_stream_status(&key(&orders(), &next_attempt)).await,
        Some(ProtocolStreamStatus::Started)
    );

    let completed: Vec<_> = client
        .update_requests()
        .await
        .into_iter()
        .filter(|update| update.run_state == StreamRunState::Complete)
        .collect();
    assert_eq!(completed.len(), 2);
    assert!(completed.iter().all(|update| update.attempt_number == ATTEMPT));
    assert!(completed.iter().all(|update| update.rate_limited_metadata.is_none()));
}

#[tokio::test]
async fn force_completion_survives_status_api_failures() {
    init_test_tracing();
    let client = FailingStatusClient::new();
    let tracker = StreamStatusTracker::new(client.clone());
    let context = context(false);

    tracker
        .track(&started(MessageOrigin::Source, &orders(), &context))
        .await;

    client.fail_updates(true);
    tracker.track(&force_completion(&context)).await;

    assert_eq!(tracker.get_stream_status(&key(&orders(), &context)).await, None);
    assert_eq!(client.update_attempts(), 1);
}

#[tokio::test]
async fn run_wide_incomplete_fails_every_stream_of_the_run() {
    init_test_tracing();
    let (tracker, client) = new_tracker();
    let context = context(false);

    for descriptor in [orders(), users()] {
        tracker
            .track(&started(MessageOrigin::Source, &descriptor, &context))
            .await;
    }
    tracker
        .track(&incomplete(
            MessageOrigin::Internal,
            &StreamDescriptor::default(),
            Some(IncompleteRunCause::Canceled),
            &context,
        ))
        .await;

    assert_eq!(tracker.tracked_streams_count().await, 0);

    let updates = client.update_requests().await;
    assert_eq!(updates.len(), 2);
    assert!(updates.iter().all(|update| {
        update.run_state == StreamRunState::Incomplete
            && update.incomplete_run_cause == Some(IncompleteRunCause::Canceled)
    }));
}

#[tokio::test]
async fn internal_completion_of_a_single_stream() {
    init_test_tracing();
    let (tracker, client) = new_tracker();
    let context = context(false);

    for descriptor in [orders(), users()] {
        tracker
            .track(&started(MessageOrigin::Source, &descriptor, &context))
            .await;
    }
    tracker
        .track(&complete(MessageOrigin::Internal, &orders(), &context))
        .await;

    assert_eq!(tracker.get_stream_status(&key(&orders(), &context)).await, None);
    assert_eq!(
        tracker.get_stream_status(&key(&users(), &context)).await,
        Some(ProtocolStreamStatus::Started)
    );

    let updates = client.update_requests().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].stream_name, "orders");
    assert_eq!(updates[0].run_state, StreamRunState::Complete);
}

#[tokio::test]
async fn force_completion_without_tracked_streams_is_a_no_op() {
    init_test_tracing();
    let (tracker, client) = new_tracker();

    tracker.track(&force_completion(&context(false))).await;

    assert_eq!(tracker.tracked_streams_count().await, 0);
    assert!(client.update_requests().await.is_empty());
}
