use super::*;
use showtime_watcher::models::{AlertKind, CycleOutcome, ExhaustionReason};

#[tokio::test(start_paused = true)]
async fn test_match_found_on_first_attempt() {
    let config = get_test_config("beta", 3);
    let fetcher = ScriptedFetcher::new(vec![Ok(titles(&["Alpha", "Beta"]))]);
    let alerts = Arc::new(RecordingAlertSink::default());
    let channel = RecordingChannel::new("console");

    let mut scheduler = create_scheduler(
        &config,
        fetcher.clone(),
        alerts.clone(),
        vec![channel.clone()],
        CancellationToken::new(),
    );

    let outcome = scheduler.run().await;

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(channel.sends(), 1);
    let events = channel.events.lock().unwrap();
    assert_eq!(events[0].matched_title, "Beta");
    assert_eq!(events[0].movie_name, "beta");
    assert_eq!(alerts.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_listing_ends_cycle_without_retry() {
    let config = get_test_config("Coolie", 3);
    let fetcher = ScriptedFetcher::new(vec![Ok(vec![])]);
    let alerts = Arc::new(RecordingAlertSink::default());
    let channel = RecordingChannel::new("console");

    let mut scheduler = create_scheduler(
        &config,
        fetcher.clone(),
        alerts.clone(),
        vec![channel.clone()],
        CancellationToken::new(),
    );

    let outcome = scheduler.run_once().await;

    match outcome {
        RunOutcome::NotFound { last_result, .. } => {
            assert_eq!(
                last_result.outcome,
                CycleOutcome::Exhausted(ExhaustionReason::NoMatch)
            );
            assert_eq!(last_result.retries(), 0);
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(channel.sends(), 0);
    assert_eq!(alerts.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_two_selector_timeouts() {
    let config = get_test_config("Coolie", 3);
    let fetcher = ScriptedFetcher::new(vec![
        fetch_error(FetchErrorKind::Timeout, "Timeout waiting for selector 'div.title'"),
        fetch_error(FetchErrorKind::Timeout, "Timeout waiting for selector 'div.title'"),
        Ok(titles(&["Coolie Premiere"])),
    ]);
    let alerts = Arc::new(RecordingAlertSink::default());

    let mut controller =
        create_controller(&config, fetcher.clone(), alerts.clone(), CancellationToken::new());
    let result = controller.run_cycle().await;

    assert_eq!(result.matched_title(), Some("Coolie Premiere"));
    assert_eq!(result.retries(), 2);
    assert_eq!(alerts.count(), 1);
    assert_eq!(alerts.alerts.lock().unwrap()[0].kind, AlertKind::FirstFailure);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_challenge_exhausts_retries() {
    let config = get_test_config("Coolie", 3);
    let fetcher = ScriptedFetcher::new(vec![
        fetch_error(FetchErrorKind::Other, "Cloudflare challenge"),
        fetch_error(FetchErrorKind::Other, "Cloudflare challenge"),
        fetch_error(FetchErrorKind::Other, "Cloudflare challenge"),
    ]);
    let alerts = Arc::new(RecordingAlertSink::default());
    let channel = RecordingChannel::new("webhook");

    let mut scheduler = create_scheduler(
        &config,
        fetcher.clone(),
        alerts.clone(),
        vec![channel.clone()],
        CancellationToken::new(),
    );

    let outcome = scheduler.run_once().await;

    match outcome {
        RunOutcome::NotFound { last_result, .. } => {
            assert_eq!(
                last_result.outcome,
                CycleOutcome::Exhausted(ExhaustionReason::RetriesSpent {
                    last_error: "Cloudflare challenge".to_string()
                })
            );
            assert_eq!(last_result.attempts_made, 3);
        }
        other => panic!("expected NotFound, got {:?}", other),
    }

    let kinds: Vec<_> = alerts.alerts.lock().unwrap().iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::FirstFailure, AlertKind::RetriesExhausted]);
    assert_eq!(channel.sends(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_is_not_retried() {
    let config = get_test_config("Coolie", 5);
    let fetcher = ScriptedFetcher::new(vec![
        fetch_error(FetchErrorKind::HttpStatus(404), "HTTP 404 Not Found"),
        Ok(titles(&["Coolie"])),
    ]);
    let alerts = Arc::new(RecordingAlertSink::default());

    let mut controller =
        create_controller(&config, fetcher.clone(), alerts.clone(), CancellationToken::new());
    let result = controller.run_cycle().await;

    assert!(!result.found());
    assert_eq!(result.attempts_made, 1);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(alerts.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_profiles_escalate_and_rotate() {
    let config = get_test_config("Coolie", 4);
    let fetcher = ScriptedFetcher::new(vec![
        fetch_error(FetchErrorKind::Network, "connection reset by peer"),
        fetch_error(FetchErrorKind::Navigation, "net::ERR_CONNECTION_CLOSED"),
        fetch_error(FetchErrorKind::HttpStatus(503), "HTTP 503 Service Unavailable"),
        Ok(titles(&["Coolie"])),
    ]);
    let alerts = Arc::new(RecordingAlertSink::default());

    let mut controller =
        create_controller(&config, fetcher.clone(), alerts, CancellationToken::new());
    let result = controller.run_cycle().await;

    assert!(result.found());
    let profiles = fetcher.profiles();
    let levels: Vec<_> = profiles.iter().map(|p| p.humanization_level).collect();
    assert_eq!(levels, vec![0, 1, 2, 3]);
    for pair in profiles.windows(2) {
        assert_ne!(pair[0].user_agent, pair[1].user_agent);
        assert_ne!(pair[0].viewport, pair[1].viewport);
    }
}
