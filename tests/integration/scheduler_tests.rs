use super::*;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_polls_until_found_then_dispatches_once() {
    let config = get_test_config("Coolie", 3);
    let fetcher = ScriptedFetcher::new(vec![
        Ok(titles(&["Jailer"])),
        Ok(titles(&["Jailer", "LEO"])),
        Ok(titles(&["Jailer", "Coolie (Tamil)"])),
        Ok(titles(&["Coolie (Tamil)"])),
    ]);
    let alerts = Arc::new(RecordingAlertSink::default());
    let channel = RecordingChannel::new("console");

    let mut scheduler = create_scheduler(
        &config,
        fetcher.clone(),
        alerts,
        vec![channel.clone()],
        CancellationToken::new(),
    );

    let started = tokio::time::Instant::now();
    let outcome = scheduler.run().await;

    assert_eq!(outcome.cycles(), 3);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(channel.sends(), 1);
    assert!(started.elapsed() >= Duration::from_secs(2 * config.polling.poll_interval_seconds));
}

#[tokio::test(start_paused = true)]
async fn test_failing_channel_does_not_block_others() {
    let config = get_test_config("Coolie", 3);
    let fetcher = ScriptedFetcher::new(vec![Ok(titles(&["Coolie"]))]);
    let email = RecordingChannel::failing("email");
    let webhook = RecordingChannel::new("webhook");

    let mut scheduler = create_scheduler(
        &config,
        fetcher,
        Arc::new(RecordingAlertSink::default()),
        vec![email.clone(), webhook.clone()],
        CancellationToken::new(),
    );

    let outcome = scheduler.run().await;

    assert_eq!(email.sends(), 1);
    assert_eq!(webhook.sends(), 1);
    match outcome {
        RunOutcome::Found { report, .. } => {
            assert_eq!(report.delivered().collect::<Vec<_>>(), vec!["webhook"]);
            assert_eq!(report.failed().count(), 1);
        }
        other => panic!("expected Found, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_cycles_sends_nothing() {
    let config = get_test_config("Coolie", 3);
    let cancel = CancellationToken::new();
    let fetcher = ScriptedFetcher::new(vec![Ok(titles(&["Jailer"])), Ok(titles(&["Coolie"]))]);
    fetcher.cancel_on_call(1, cancel.clone());
    let channel = RecordingChannel::new("console");

    let mut scheduler = create_scheduler(
        &config,
        fetcher.clone(),
        Arc::new(RecordingAlertSink::default()),
        vec![channel.clone()],
        cancel,
    );

    let started = tokio::time::Instant::now();
    let outcome = scheduler.run().await;

    assert!(matches!(outcome, RunOutcome::Cancelled { cycles: 1 }));
    assert_eq!(outcome.exit_code(), 130);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(channel.sends(), 0);
    assert!(started.elapsed() < Duration::from_secs(config.polling.poll_interval_seconds));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_sends_nothing() {
    let config = get_test_config("Coolie", 3);
    let cancel = CancellationToken::new();
    let fetcher = ScriptedFetcher::new(vec![
        fetch_error(FetchErrorKind::Blocked, "Cloudflare challenge page served (HTTP 403)"),
        Ok(titles(&["Coolie"])),
    ]);
    fetcher.cancel_on_call(1, cancel.clone());
    let channel = RecordingChannel::new("console");

    let mut scheduler = create_scheduler(
        &config,
        fetcher.clone(),
        Arc::new(RecordingAlertSink::default()),
        vec![channel.clone()],
        cancel,
    );

    let outcome = scheduler.run().await;

    assert!(matches!(outcome, RunOutcome::Cancelled { .. }));
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(channel.sends(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_once_does_not_wait_for_next_cycle() {
    let config = get_test_config("Coolie", 3);
    let fetcher = ScriptedFetcher::new(vec![Ok(titles(&["Jailer"])), Ok(titles(&["Coolie"]))]);
    let channel = RecordingChannel::new("console");

    let mut scheduler = create_scheduler(
        &config,
        fetcher.clone(),
        Arc::new(RecordingAlertSink::default()),
        vec![channel.clone()],
        CancellationToken::new(),
    );

    let started = tokio::time::Instant::now();
    let outcome = scheduler.run_once().await;

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(channel.sends(), 0);
    assert!(started.elapsed() < Duration::from_secs(1));
}
