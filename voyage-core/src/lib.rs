#[macro_use]
mod macros;

pub mod events;
pub mod identity;
pub mod models;
pub mod providers;
pub mod repository;
pub mod search;
pub mod validation;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream provider error: {0}")]
    Provider(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
