use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use showtime_watcher::alerts::build_alert_sink;
use showtime_watcher::config::AppConfig;
use showtime_watcher::core::{ProfileRotator, RetryController};
use showtime_watcher::fetcher::build_fetcher;
use showtime_watcher::plugins::{NotificationDispatcher, build_channels};
use showtime_watcher::{PollScheduler, RunOutcome, logging};

const STARTUP_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "showtime-watcher",
    version,
    about = "Watches a ticketing listing page and alerts once a movie opens for booking"
)]
struct Args {
    /// Config file path; the extension may be omitted
    #[arg(short, long, default_value = "config/default")]
    config: String,

    /// Run a single check and exit (for cron)
    #[arg(long)]
    once: bool,

    /// Seed for header and backoff randomness
    #[arg(long)]
    seed: Option<u64>,
}

struct Monitor {
    scheduler: PollScheduler,
    cancel: CancellationToken,
    config: AppConfig,
    _log_guard: Option<WorkerGuard>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let mut monitor = match setup(&args) {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(STARTUP_FAILURE);
        }
    };

    print_banner(&monitor.config, args.once);

    let cancel = monitor.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stop requested, finishing current step");
            cancel.cancel();
        }
    });

    let outcome = if args.once {
        monitor.scheduler.run_once().await
    } else {
        monitor.scheduler.run().await
    };

    report(&outcome);
    ExitCode::from(outcome.exit_code())
}

fn setup(args: &Args) -> Result<Monitor> {
    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from '{}'", args.config))?;
    if args.seed.is_some() {
        config.polling.random_seed = args.seed;
    }

    let log_guard = logging::init(&config.logging).context("Failed to initialise logging")?;
    info!(
        movie = %config.target.name,
        url = %config.target.url,
        fetcher = ?config.target.fetcher,
        max_attempts = config.polling.max_retries_per_cycle,
        "Configuration loaded"
    );

    let channels =
        build_channels(&config.notifications).context("Failed to set up notification channels")?;
    if channels.is_empty() {
        warn!("No notification channels enabled; a match will only be logged");
    }
    let alert_sink = build_alert_sink(&config.admin_alerts, &channels);
    let dispatcher = NotificationDispatcher::new(channels);
    info!(channels = ?dispatcher.channel_names(), "Notification channels ready");

    let cancel = CancellationToken::new();
    let rotator =
        ProfileRotator::new(config.polling.random_seed).with_proxy(config.target.proxy.clone());
    let controller = RetryController::new(
        build_fetcher(&config.target),
        rotator,
        &config.target,
        &config.polling,
    )
    .with_alert_sink(alert_sink)
    .with_cancellation(cancel.clone());

    let scheduler = PollScheduler::new(controller, dispatcher, &config.polling);

    Ok(Monitor {
        scheduler,
        cancel,
        config,
        _log_guard: log_guard,
    })
}

fn print_banner(config: &AppConfig, once: bool) {
    if once {
        println!("Checking for movie: {}", config.target.name);
        println!("URL: {}", config.target.url);
        return;
    }

    println!("🎬 Movie Monitor Started");
    println!("Monitoring: {}", config.target.name);
    println!("URL: {}", config.target.url);
    println!("Check interval: {} seconds", config.polling.poll_interval_seconds);
    println!("Press Ctrl+C to stop\n");
}

fn report(outcome: &RunOutcome) {
    let cycles = outcome.cycles();
    match outcome {
        RunOutcome::Found { report, .. } => {
            if !report.all_delivered() {
                for failed in report.failed() {
                    warn!(
                        channel = %failed.channel,
                        error = failed.error.as_deref().unwrap_or_default(),
                        "Channel did not deliver"
                    );
                }
            }
            info!(cycles, delivered = report.delivered_count(), "Run finished");
            println!("Movie found! Notifications sent.");
        }
        RunOutcome::NotFound { last_result, .. } => {
            info!(cycles, attempts = last_result.attempts_made, "Run finished without a match");
            println!("Movie not found yet.");
        }
        RunOutcome::Cancelled { .. } => {
            info!(cycles, "Run cancelled");
            println!("\nMovie monitor stopped.");
        }
    }
}
