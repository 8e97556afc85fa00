use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::models::{FetchProfile, Viewport};
use crate::utils::error::{AppError, Result};

pub const DEFAULT_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

pub const DEFAULT_VIEWPORTS: [Viewport; 4] = [
    Viewport::new(1920, 1080),
    Viewport::new(1366, 768),
    Viewport::new(1536, 864),
    Viewport::new(1440, 900),
];

const ACCEPT_LANGUAGES: [&str; 3] = ["en-US,en;q=0.9", "en-IN,en;q=0.9,hi;q=0.8", "en-GB,en;q=0.8"];

/// Client hints a Chromium browser sends alongside its user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClientHints {
    brand: &'static str,
    major_version: u32,
    platform: &'static str,
    mobile: bool,
}

impl ClientHints {
    /// Hints implied by a user agent string. `None` for browsers that do not
    /// send `Sec-CH-UA` (Safari, Firefox) or agents that cannot be parsed.
    fn from_user_agent(user_agent: &str) -> Option<Self> {
        let major_version = major_version_after(user_agent, "Chrome/")?;
        let brand = if user_agent.contains("Edg/") {
            "Microsoft Edge"
        } else {
            "Google Chrome"
        };
        let platform = if user_agent.contains("Android") {
            "Android"
        } else if user_agent.contains("Windows") {
            "Windows"
        } else if user_agent.contains("Macintosh") || user_agent.contains("Mac OS X") {
            "macOS"
        } else if user_agent.contains("CrOS") {
            "Chrome OS"
        } else if user_agent.contains("Linux") {
            "Linux"
        } else {
            return None;
        };

        Some(Self {
            brand,
            major_version,
            platform,
            mobile: user_agent.contains("Mobile"),
        })
    }

    fn insert_into(&self, headers: &mut BTreeMap<String, String>) {
        headers.insert(
            "Sec-CH-UA".to_string(),
            format!(
                "\"Chromium\";v=\"{v}\", \"{brand}\";v=\"{v}\", \"Not=A?Brand\";v=\"99\"",
                v = self.major_version,
                brand = self.brand
            ),
        );
        headers.insert(
            "Sec-CH-UA-Mobile".to_string(),
            if self.mobile { "?1" } else { "?0" }.to_string(),
        );
        headers.insert("Sec-CH-UA-Platform".to_string(), format!("\"{}\"", self.platform));
    }
}

fn major_version_after(user_agent: &str, token: &str) -> Option<u32> {
    let (_, rest) = user_agent.split_once(token)?;
    rest.split(|c: char| !c.is_ascii_digit()).next()?.parse().ok()
}

/// Hands out one [`FetchProfile`] per attempt.
///
/// User agents and viewports are walked round-robin with two independent
/// cursors that live as long as the rotator, so a new cycle continues where the
/// previous one stopped. Client hints are derived from the chosen user agent
/// so the two never disagree; `Accept-Language` is drawn from the rotator's
/// own RNG, which can be seeded or switched off for reproducible runs.
pub struct ProfileRotator {
    user_agents: Vec<String>,
    viewports: Vec<Viewport>,
    user_agent_cursor: usize,
    viewport_cursor: usize,
    proxy: Option<String>,
    header_jitter: bool,
    rng: StdRng,
}

impl ProfileRotator {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            viewports: DEFAULT_VIEWPORTS.to_vec(),
            user_agent_cursor: 0,
            viewport_cursor: 0,
            proxy: None,
            header_jitter: true,
            rng: rng_from_seed(seed),
        }
    }

    pub fn with_pools(
        user_agents: Vec<String>,
        viewports: Vec<Viewport>,
        seed: Option<u64>,
    ) -> Result<Self> {
        if user_agents.is_empty() {
            return Err(AppError::Validation("user agent pool must not be empty".into()));
        }
        if viewports.is_empty() {
            return Err(AppError::Validation("viewport pool must not be empty".into()));
        }

        Ok(Self {
            user_agents,
            viewports,
            ..Self::new(seed)
        })
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// With jitter off `Accept-Language` always takes its first option.
    pub fn with_header_jitter(mut self, enabled: bool) -> Self {
        self.header_jitter = enabled;
        self
    }

    pub fn next_profile(&mut self, retry_index: u32) -> FetchProfile {
        let user_agent = self.user_agents[self.user_agent_cursor].clone();
        self.user_agent_cursor = (self.user_agent_cursor + 1) % self.user_agents.len();

        let viewport = self.viewports[self.viewport_cursor];
        self.viewport_cursor = (self.viewport_cursor + 1) % self.viewports.len();

        let headers = self.draw_headers(&user_agent);

        FetchProfile {
            user_agent,
            viewport,
            headers,
            humanization_level: retry_index,
            proxy: self.proxy.clone(),
        }
    }

    fn draw_headers(&mut self, user_agent: &str) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Accept-Language".to_string(),
            self.pick(&ACCEPT_LANGUAGES).to_string(),
        );
        if let Some(hints) = ClientHints::from_user_agent(user_agent) {
            hints.insert_into(&mut headers);
        }
        headers.insert("Upgrade-Insecure-Requests".to_string(), "1".to_string());
        headers
    }

    fn pick(&mut self, options: &[&'static str]) -> &'static str {
        if self.header_jitter {
            options[self.rng.random_range(0..options.len())]
        } else {
            options[0]
        }
    }
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
