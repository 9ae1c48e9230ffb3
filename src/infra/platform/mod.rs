pub mod log_platform;

pub use log_platform::LogNotificationPlatform;
