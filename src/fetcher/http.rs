use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::{
    FetchError, FetchErrorKind, FetchSettings, PageFetcher, extract_titles, is_challenge_page,
    is_interstitial_title, page_title,
};
use crate::models::FetchProfile;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Plain HTTP fetcher: one GET, parse the listing out of the returned HTML.
///
/// Cheaper than the browser but only sees server-rendered markup.
pub struct HttpFetcher {
    settings: FetchSettings,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, profile: &FetchProfile) -> Result<Client, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        for (name, value) in &profile.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }

        let mut builder = Client::builder()
            .user_agent(profile.user_agent.as_str())
            .default_headers(headers)
            .timeout(self.settings.request_timeout);

        if let Some(proxy) = &profile.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|e| {
                FetchError::new(FetchErrorKind::Other, format!("Invalid proxy '{}': {}", proxy, e))
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|e| {
            FetchError::new(FetchErrorKind::Other, format!("Failed to build HTTP client: {}", e))
        })
    }

    async fn pause_before_request(&self, humanization_level: u32) {
        let Some(pause_range) = self.settings.interaction_delay_range(humanization_level) else {
            return;
        };
        let pause_ms = rand::rng().random_range(pause_range);
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str, profile: &FetchProfile) -> Result<Vec<String>, FetchError> {
        self.pause_before_request(profile.humanization_level).await;

        let client = self.build_client(profile)?;
        let response = client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        check_status(status, &body)?;

        let titles = extract_titles(&body, &self.settings.listing_selector)?;
        if titles.is_empty() {
            check_interstitial(status, &body)?;
        }
        Ok(titles)
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), FetchError> {
    if is_block_status(status) && is_challenge_page(body) {
        return Err(FetchError::new(
            FetchErrorKind::Blocked,
            format!("Cloudflare challenge page served (HTTP {})", status.as_u16()),
        ));
    }

    if status == StatusCode::FORBIDDEN {
        return Err(FetchError::new(
            FetchErrorKind::Blocked,
            "HTTP 403 Forbidden: request blocked",
        ));
    }

    if !status.is_success() {
        return Err(FetchError::new(
            FetchErrorKind::HttpStatus(status.as_u16()),
            format!("HTTP {}", status),
        ));
    }

    Ok(())
}

/// A successful response with no listing that is titled like an interstitial.
fn check_interstitial(status: StatusCode, body: &str) -> Result<(), FetchError> {
    match page_title(body) {
        Some(title) if is_interstitial_title(&title) => Err(FetchError::new(
            FetchErrorKind::Blocked,
            format!(
                "Cloudflare challenge page served (HTTP {}): {}",
                status.as_u16(),
                title
            ),
        )),
        _ => Ok(()),
    }
}

fn is_block_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    )
}

fn request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::new(FetchErrorKind::Timeout, format!("Request timeout: {}", e))
    } else if e.is_redirect() {
        FetchError::new(FetchErrorKind::Navigation, format!("Redirect failed: {}", e))
    } else {
        FetchError::new(FetchErrorKind::Network, format!("Request error: {}", e))
    }
}
