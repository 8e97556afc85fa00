use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The single "target is listed" event of a run.
///
/// Built once when a cycle succeeds and handed to every channel by reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub movie_name: String,
    pub matched_title: String,
    pub target_url: String,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(movie_name: &str, matched_title: &str, target_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            movie_name: movie_name.to_string(),
            matched_title: matched_title.to_string(),
            target_url: target_url.to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub fn headline(&self) -> String {
        format!("🎬 Movie Alert: {} is now available!", self.movie_name)
    }

    /// Plain-text body shared by the text based channels.
    pub fn body(&self) -> String {
        format!(
            "Great news! The movie \"{}\" is now available for booking (listed as \"{}\").\n\n\
             You can book your tickets here: {}\n\n\
             Time: {}",
            self.movie_name,
            self.matched_title,
            self.target_url,
            self.occurred_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}
