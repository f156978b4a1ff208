//! Shared utilities

pub mod error;
pub mod logger;

pub use error::{ok, ok_with_message, AppError, AppResponse};
pub use logger::{init_logger, init_logger_with_file};

/// Application-level result type
pub type AppResult<T> = Result<T, AppError>;
