pub mod admin_alert;
pub mod attempt_outcome;
pub mod fetch_profile;
pub mod notification_event;
pub mod poll_cycle;

// Re-exports for convenience
pub use admin_alert::*;
pub use attempt_outcome::*;
pub use fetch_profile::*;
pub use notification_event::*;
pub use poll_cycle::*;
