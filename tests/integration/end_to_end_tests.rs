use super::*;
use serde_json::json;
use showtime_watcher::alerts::build_alert_sink;
use showtime_watcher::fetcher::build_fetcher;
use showtime_watcher::models::{CycleOutcome, ExhaustionReason};
use showtime_watcher::plugins::build_channels;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_HTML: &str = r#"
    <html>
        <body>
            <div class="listing"><div class="title">Jailer</div></div>
            <div class="listing"><div class="title">  Coolie
                (Tamil) </div></div>
        </body>
    </html>
"#;

fn http_config(site: &MockServer, hook: &MockServer, max_attempts: u32) -> AppConfig {
    let mut config = get_test_config("coolie", max_attempts);
    config.target.url = format!("{}/explore/movies-chennai", site.uri());
    config.target.listing_selector = "div.title".to_string();
    config.target.interaction_delay_min_ms = 0;
    config.target.interaction_delay_max_ms = 0;
    config.target.request_timeout_secs = 5;
    config.polling.backoff_min_ms = 1;
    config.polling.backoff_max_ms = 5;
    config.notifications.console.enabled = false;
    config.notifications.webhook.enabled = true;
    config.notifications.webhook.url = format!("{}/hook", hook.uri());
    config
}

fn build_scheduler(config: &AppConfig) -> PollScheduler {
    let channels = build_channels(&config.notifications).unwrap();
    let alerts = build_alert_sink(&config.admin_alerts, &channels);
    let controller = RetryController::new(
        build_fetcher(&config.target),
        ProfileRotator::new(config.polling.random_seed),
        &config.target,
        &config.polling,
    )
    .with_alert_sink(alerts);

    PollScheduler::new(controller, NotificationDispatcher::new(channels), &config.polling)
}

#[tokio::test]
async fn test_http_listing_to_webhook() {
    let site = MockServer::start().await;
    let hook = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explore/movies-chennai"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_HTML))
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "event": "movie_available",
            "matched_title": "Coolie (Tamil)"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&hook)
        .await;

    let config = http_config(&site, &hook, 3);
    let outcome = build_scheduler(&config).run_once().await;

    assert_eq!(outcome.exit_code(), 0);
    match outcome {
        RunOutcome::Found { report, .. } => assert!(report.all_delivered()),
        other => panic!("expected Found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_listing_with_cloudflare_script_is_found() {
    let site = MockServer::start().await;
    let hook = MockServer::start().await;

    let body = LISTING_HTML.replace(
        "<body>",
        r#"<body><script src="/cdn-cgi/challenge-platform/scripts/jsd/main.js"></script>"#,
    );
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "event": "movie_available" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&hook)
        .await;

    let config = http_config(&site, &hook, 3);
    let outcome = build_scheduler(&config).run_once().await;

    assert_eq!(outcome.exit_code(), 0);
    assert!(matches!(outcome, RunOutcome::Found { .. }));
}

#[tokio::test]
async fn test_webhook_outage_still_counts_as_found() {
    let site = MockServer::start().await;
    let hook = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_HTML))
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&hook)
        .await;

    let config = http_config(&site, &hook, 3);
    let outcome = build_scheduler(&config).run_once().await;

    assert_eq!(outcome.exit_code(), 0);
    match outcome {
        RunOutcome::Found { report, .. } => {
            let failed: Vec<_> = report.failed().collect();
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].channel, "webhook");
        }
        other => panic!("expected Found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_challenge_page_raises_admin_alerts() {
    let site = MockServer::start().await;
    let hook = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string("<html><head><title>Just a moment...</title></head></html>"),
        )
        .expect(2)
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "event": "admin_alert" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&hook)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "event": "movie_available" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&hook)
        .await;

    let mut config = http_config(&site, &hook, 2);
    config.admin_alerts.enabled = true;
    config.admin_alerts.channels = vec!["webhook".to_string()];

    let outcome = build_scheduler(&config).run_once().await;

    assert_eq!(outcome.exit_code(), 1);
    match outcome {
        RunOutcome::NotFound { last_result, .. } => {
            assert!(matches!(
                last_result.outcome,
                CycleOutcome::Exhausted(ExhaustionReason::RetriesSpent { .. })
            ));
            assert_eq!(last_result.attempts_made, 2);
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}
