use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Notification platform error: {0}")]
    Platform(String),
    #[error("Store error: {0}")]
    Store(String),
}
