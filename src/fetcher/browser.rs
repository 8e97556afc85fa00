use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::Rng;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use super::{FetchError, FetchErrorKind, FetchSettings, PageFetcher, extract_titles, is_interstitial_title};
use crate::models::FetchProfile;

/// Headless Chrome backed fetcher.
///
/// Every call launches its own browser and tears it down again, so nothing
/// (cookies, fingerprints, a wedged renderer) leaks from one attempt into the
/// next.
pub struct ChromeFetcher {
    settings: FetchSettings,
}

impl ChromeFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&self, url: &str, profile: &FetchProfile) -> Result<Vec<String>, FetchError> {
        let settings = self.settings.clone();
        let url = url.to_string();
        let profile = profile.clone();

        // headless_chrome is synchronous; keep it off the runtime thread.
        tokio::task::spawn_blocking(move || fetch_blocking(&settings, &url, &profile))
            .await
            .map_err(|e| {
                FetchError::new(FetchErrorKind::Other, format!("Browser task failed: {}", e))
            })?
    }
}

fn fetch_blocking(
    settings: &FetchSettings,
    url: &str,
    profile: &FetchProfile,
) -> Result<Vec<String>, FetchError> {
    let browser = launch_browser(settings, profile)?;

    let tab = browser.new_tab().map_err(|e| {
        FetchError::new(FetchErrorKind::BrowserLaunch, format!("Failed to create tab: {}", e))
    })?;

    let result = load_listing(&tab, settings, url, profile);

    // Close tab to free resources; the browser process goes with `browser`.
    let _ = tab.close(true);

    result
}

fn launch_browser(settings: &FetchSettings, profile: &FetchProfile) -> Result<Browser, FetchError> {
    let mut launch_options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false) // Often needed in containerized environments
        .window_size(Some((profile.viewport.width, profile.viewport.height)))
        .idle_browser_timeout(settings.request_timeout * 2)
        .args(vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-extensions"),
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--no-first-run"),
        ])
        .build()
        .map_err(|e| {
            FetchError::new(
                FetchErrorKind::BrowserLaunch,
                format!("Failed to create launch options: {}", e),
            )
        })?;

    if let Some(chrome_path) = &settings.chrome_path {
        launch_options.path = Some(PathBuf::from(chrome_path));
    }
    launch_options.proxy_server = profile.proxy.as_deref();

    Browser::new(launch_options).map_err(|e| {
        FetchError::new(FetchErrorKind::BrowserLaunch, format!("Failed to launch browser: {}", e))
    })
}

fn load_listing(
    tab: &Tab,
    settings: &FetchSettings,
    url: &str,
    profile: &FetchProfile,
) -> Result<Vec<String>, FetchError> {
    tab.set_default_timeout(settings.request_timeout);

    let accept_language = profile.header("Accept-Language");
    let platform = profile
        .header("Sec-CH-UA-Platform")
        .map(|platform| platform.trim_matches('"'));
    tab.set_user_agent(&profile.user_agent, accept_language, platform)
        .map_err(|e| {
            FetchError::new(FetchErrorKind::Other, format!("Failed to set user agent: {}", e))
        })?;

    let headers: HashMap<&str, &str> = profile
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    tab.set_extra_http_headers(headers).map_err(|e| {
        FetchError::new(FetchErrorKind::Other, format!("Failed to set headers: {}", e))
    })?;

    tab.navigate_to(url).map_err(|e| {
        FetchError::new(FetchErrorKind::Navigation, format!("Navigation failed: {}", e))
    })?;
    tab.wait_until_navigated().map_err(|e| {
        FetchError::new(FetchErrorKind::Navigation, format!("Page load failed: {}", e))
    })?;

    if let Ok(title) = tab.get_title() {
        if is_interstitial_title(&title) {
            return Err(FetchError::new(
                FetchErrorKind::Blocked,
                format!("Cloudflare challenge page served: {}", title),
            ));
        }
    }

    tab.wait_for_element_with_custom_timeout(&settings.listing_selector, settings.request_timeout)
        .map_err(|e| {
            FetchError::new(
                FetchErrorKind::Timeout,
                format!(
                    "Timeout waiting for selector '{}': {}",
                    settings.listing_selector, e
                ),
            )
        })?;

    simulate_reading(tab, settings, profile.humanization_level);

    let html = tab.get_content().map_err(|e| {
        FetchError::new(FetchErrorKind::Navigation, format!("Failed to get page content: {}", e))
    })?;

    extract_titles(&html, &settings.listing_selector)
}

/// A few scrolls with pauses, more and longer ones on later retries.
fn simulate_reading(tab: &Tab, settings: &FetchSettings, humanization_level: u32) {
    let Some(pause_range) = settings.interaction_delay_range(humanization_level) else {
        return;
    };

    let mut rng = rand::rng();
    for _ in 0..(2 + humanization_level.min(4)) {
        std::thread::sleep(Duration::from_millis(rng.random_range(pause_range.clone())));
        let distance: u32 = rng.random_range(200..700);
        // A failed scroll only costs realism.
        let _ = tab.evaluate(&format!("window.scrollBy(0, {})", distance), false);
    }
}
