use tracing::warn;

use crate::fetcher::{FetchError, FetchErrorKind};
use crate::models::AttemptOutcome;

/// Tokens that mark an error message as anti-automation interference.
const BLOCK_TOKENS: [&str; 3] = ["cloudflare", "blocked", "timeout"];

/// Maps a raw fetch result onto an [`AttemptOutcome`]. Total: every input has
/// an outcome.
#[derive(Debug, Clone)]
pub struct AttemptClassifier {
    target_name: String,
    folded_target: String,
}

impl AttemptClassifier {
    pub fn new(target_name: &str) -> Self {
        Self {
            target_name: target_name.to_string(),
            folded_target: target_name.to_lowercase(),
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn classify(&self, fetch_result: Result<Vec<String>, FetchError>) -> AttemptOutcome {
        match fetch_result {
            Ok(listing_titles) => self.classify_listing(listing_titles),
            Err(error) => classify_error(&error),
        }
    }

    fn classify_listing(&self, listing_titles: Vec<String>) -> AttemptOutcome {
        if listing_titles.is_empty() {
            warn!("No listing titles found - page structure might have changed");
            return AttemptOutcome::NotFound { listing_titles };
        }

        let matched = listing_titles
            .iter()
            .find(|title| title.to_lowercase().contains(&self.folded_target))
            .cloned();

        match matched {
            Some(matched_title) => AttemptOutcome::Found {
                listing_titles,
                matched_title,
            },
            None => AttemptOutcome::NotFound { listing_titles },
        }
    }
}

fn classify_error(error: &FetchError) -> AttemptOutcome {
    let raw_error = error.message.clone();
    let lowered = raw_error.to_lowercase();

    if BLOCK_TOKENS.iter().any(|token| lowered.contains(token)) {
        return AttemptOutcome::Blocked { raw_error };
    }

    match error.kind {
        FetchErrorKind::Blocked => AttemptOutcome::Blocked { raw_error },
        FetchErrorKind::Timeout | FetchErrorKind::Navigation | FetchErrorKind::Network => {
            AttemptOutcome::TransientError { raw_error }
        }
        FetchErrorKind::HttpStatus(status) if status >= 500 || status == 429 => {
            AttemptOutcome::TransientError { raw_error }
        }
        FetchErrorKind::HttpStatus(_)
        | FetchErrorKind::BrowserLaunch
        | FetchErrorKind::InvalidSelector
        | FetchErrorKind::Other => AttemptOutcome::FatalError { raw_error },
    }
}
