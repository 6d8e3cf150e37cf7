use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("VALIDATION_FAILED: {0}")]
    Validation(String),
    #[error("PARSE_FAILURE: {0}")]
    Parse(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(value: chrono::ParseError) -> Self {
        Self::Parse(value.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(value: std::num::ParseIntError) -> Self {
        Self::Parse(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
