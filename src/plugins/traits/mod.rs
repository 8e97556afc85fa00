pub mod notifier;

pub use notifier::NotificationChannel;

#[cfg(test)]
pub use notifier::MockNotificationChannel;
