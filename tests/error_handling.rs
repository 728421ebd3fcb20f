//! Error-path tests: timeouts, cancellation, filter failures, pre-emption.

use std::sync::Arc;
use std::time::Duration;
use waitline::{
    try_filter_fn, EventKind, EventRouter, Result, SubjectId, SubjectRef, WaitError,
    WaitOptions, WaiterRegistry,
};

#[derive(Clone, Debug, PartialEq)]
struct Update {
    chat: i64,
    text: String,
}

fn update(chat: i64, text: &str) -> Update {
    Update {
        chat,
        text: text.to_string(),
    }
}

fn spawn_wait(
    registry: &Arc<WaiterRegistry<Update>>,
    chat: i64,
    kind: EventKind,
    options: WaitOptions<Update>,
) -> tokio::task::JoinHandle<Result<Update>> {
    let registry = Arc::clone(registry);
    tokio::spawn(async move { registry.register_wait(SubjectId(chat), kind, options).await })
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fires_no_earlier_than_deadline() {
    let registry = Arc::new(WaiterRegistry::<Update>::new());
    let limit = Duration::from_secs(5);
    let start = tokio::time::Instant::now();

    let waiter = spawn_wait(&registry, 9, EventKind::Message, WaitOptions::timeout(limit));
    tokio::task::yield_now().await;

    assert_eq!(waiter.await.unwrap(), Err(WaitError::Timeout(limit)));
    assert!(start.elapsed() >= limit);

    // The timed-out wait removed itself from the store.
    assert_eq!(registry.pending_count(), 0);
    let resolved = registry
        .on_event(SubjectId(9), EventKind::Message, &update(9, "late"))
        .await
        .unwrap();
    assert!(!resolved);
}

#[tokio::test(start_paused = true)]
async fn test_event_before_deadline_beats_timeout() {
    let registry = Arc::new(WaiterRegistry::<Update>::new());
    let waiter = spawn_wait(
        &registry,
        9,
        EventKind::Message,
        WaitOptions::timeout(Duration::from_secs(5)),
    );
    tokio::task::yield_now().await;

    tokio::time::sleep(Duration::from_secs(4)).await;
    let resolved = registry
        .on_event(SubjectId(9), EventKind::Message, &update(9, "just in time"))
        .await
        .unwrap();
    assert!(resolved);
    assert_eq!(waiter.await.unwrap(), Ok(update(9, "just in time")));
}

#[tokio::test]
async fn test_cancel_without_waiter_is_silent() {
    let registry = WaiterRegistry::<Update>::new();
    // Nothing registered at all.
    assert!(!registry.cancel_wait(SubjectId(1), EventKind::Message));
    assert_eq!(registry.pending_count(), 0);
}

#[tokio::test]
async fn test_cancelled_wait_reports_cancelled() {
    let registry = Arc::new(WaiterRegistry::<Update>::new());
    let waiter = spawn_wait(&registry, 3, EventKind::Callback, WaitOptions::new());
    tokio::task::yield_now().await;

    assert!(registry.cancel_wait(SubjectId(3), EventKind::Callback));
    assert_eq!(waiter.await.unwrap(), Err(WaitError::Cancelled));

    // Subsequent events for the key fall through.
    let resolved = registry
        .on_event(SubjectId(3), EventKind::Callback, &update(3, "x"))
        .await
        .unwrap();
    assert!(!resolved);
}

#[tokio::test]
async fn test_filter_failure_reaches_waiter_and_dispatcher() {
    let router = Arc::new(EventRouter::<Update>::new());
    router.set_extractor(EventKind::Message, |event: &Update| {
        Some(SubjectId(event.chat))
    });

    let waiter = {
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            router
                .wait_for(
                    SubjectId(2),
                    EventKind::Message,
                    WaitOptions::new().with_filter(try_filter_fn(|_, _: &Update| {
                        Err(WaitError::Filter("predicate exploded".to_string()))
                    })),
                )
                .await
        })
    };
    tokio::task::yield_now().await;

    // The dispatcher sees the failure rather than a silent non-match.
    let err = router
        .dispatch(EventKind::Message, update(2, "anything"))
        .await
        .unwrap_err();
    assert_eq!(err, WaitError::Filter("predicate exploded".to_string()));

    // So does the waiter, and the store entry is gone.
    assert_eq!(
        waiter.await.unwrap(),
        Err(WaitError::Filter("predicate exploded".to_string()))
    );
    assert_eq!(router.registry().pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_new_wait_preempts_old_one() {
    let registry = Arc::new(WaiterRegistry::<Update>::new());
    let first = spawn_wait(
        &registry,
        6,
        EventKind::Message,
        WaitOptions::timeout(Duration::from_secs(30)),
    );
    tokio::task::yield_now().await;

    let second = spawn_wait(
        &registry,
        6,
        EventKind::Message,
        WaitOptions::timeout(Duration::from_secs(30)),
    );
    tokio::task::yield_now().await;

    // Only the newer record is visible, and the old waiter can never be
    // resolved by a future event.
    assert_eq!(registry.pending_count(), 1);
    assert_eq!(first.await.unwrap(), Err(WaitError::Cancelled));

    let resolved = registry
        .on_event(SubjectId(6), EventKind::Message, &update(6, "for the new one"))
        .await
        .unwrap();
    assert!(resolved);
    assert_eq!(second.await.unwrap(), Ok(update(6, "for the new one")));
}

#[tokio::test]
async fn test_unresolvable_subject_reference() {
    let router = EventRouter::<Update>::new();
    let err = router
        .wait_for_ref(
            &SubjectRef::from("ghost"),
            EventKind::Message,
            WaitOptions::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, WaitError::UnknownSubject("ghost".to_string()));
}
