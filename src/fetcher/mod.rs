//! Page fetching backends.
//!
//! A fetcher turns a target URL and a [`FetchProfile`] into the ordered list of
//! listing titles on the page, or a [`FetchError`] describing what went wrong.
//! Whatever resource a fetch needs (a browser process, an HTTP client) is
//! created inside the call and dropped before it returns.

pub mod browser;
pub mod http;

pub use browser::ChromeFetcher;
pub use http::HttpFetcher;

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{FetcherKind, TargetConfig};
use crate::models::FetchProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The fetcher recognised an anti-automation response.
    Blocked,
    Timeout,
    Navigation,
    Network,
    HttpStatus(u16),
    BrowserLaunch,
    InvalidSelector,
    Other,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Blocked => write!(f, "blocked"),
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Navigation => write!(f, "navigation"),
            FetchErrorKind::Network => write!(f, "network"),
            FetchErrorKind::HttpStatus(status) => write!(f, "http {}", status),
            FetchErrorKind::BrowserLaunch => write!(f, "browser launch"),
            FetchErrorKind::InvalidSelector => write!(f, "invalid selector"),
            FetchErrorKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str, profile: &FetchProfile) -> Result<Vec<String>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub listing_selector: String,
    pub request_timeout: Duration,
    pub chrome_path: Option<String>,
    pub interaction_delay_min_ms: u64,
    pub interaction_delay_max_ms: u64,
}

impl FetchSettings {
    pub fn from_target(target: &TargetConfig) -> Self {
        Self {
            listing_selector: target.listing_selector.clone(),
            request_timeout: Duration::from_secs(target.request_timeout_secs),
            chrome_path: target.chrome_path.clone(),
            interaction_delay_min_ms: target.interaction_delay_min_ms,
            interaction_delay_max_ms: target.interaction_delay_max_ms,
        }
    }

    /// Pause range in milliseconds for simulated interaction, widened by the
    /// humanization level. `None` disables pauses.
    pub fn interaction_delay_range(&self, humanization_level: u32) -> Option<Range<u64>> {
        if self.interaction_delay_max_ms == 0 {
            return None;
        }
        let scale = u64::from(humanization_level) + 1;
        let start = self.interaction_delay_min_ms.saturating_mul(scale);
        let end = self.interaction_delay_max_ms.saturating_mul(scale);
        if start >= end {
            return Some(start..start + 1);
        }
        Some(start..end)
    }
}

pub fn build_fetcher(target: &TargetConfig) -> Arc<dyn PageFetcher> {
    let settings = FetchSettings::from_target(target);
    match target.fetcher {
        FetcherKind::Browser => Arc::new(ChromeFetcher::new(settings)),
        FetcherKind::Http => Arc::new(HttpFetcher::new(settings)),
    }
}

const CHALLENGE_MARKERS: [&str; 5] = [
    "just a moment",
    "attention required",
    "cf-chl",
    "challenge-platform",
    "cf-browser-verification",
];

const INTERSTITIAL_TITLES: [&str; 2] = ["just a moment", "attention required"];

/// True when a body carries Cloudflare challenge markup.
///
/// Only meaningful on an error response: the `challenge-platform` script is
/// also injected into ordinary pages served through Cloudflare.
pub fn is_challenge_page(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// True when a document title is one of Cloudflare's interstitial titles.
pub fn is_interstitial_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    INTERSTITIAL_TITLES.iter().any(|marker| lowered.contains(marker))
}

/// Text of the document's `<title>`, if any.
pub fn page_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);
    let title = document
        .select(&selector)
        .next()?
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

/// Text of every element matching `selector`, in document order.
///
/// Inner whitespace runs are collapsed to one space and elements without text
/// are skipped.
pub fn extract_titles(html: &str, selector: &str) -> Result<Vec<String>, FetchError> {
    let css_selector = Selector::parse(selector).map_err(|e| {
        FetchError::new(
            FetchErrorKind::InvalidSelector,
            format!("Invalid CSS selector '{}': {:?}", selector, e),
        )
    })?;

    let document = Html::parse_document(html);
    let titles = document
        .select(&css_selector)
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|title| !title.is_empty())
        .collect();

    Ok(titles)
}
