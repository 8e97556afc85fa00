pub mod backoff;
pub mod classifier;
pub mod profile_rotator;
pub mod retry_controller;

pub use backoff::BackoffPolicy;
pub use classifier::AttemptClassifier;
pub use profile_rotator::ProfileRotator;
pub use retry_controller::RetryController;
