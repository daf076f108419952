use thiserror::Error;
use tracing::error;
use voyage_core::CoreError;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected {service} response: {message}")]
    Decode { service: &'static str, message: String },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    pub(crate) fn decode(service: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Decode {
            service,
            message: message.into(),
        }
    }
}

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidInput(msg) => CoreError::Validation(msg),
            ProviderError::NotConfigured(service) => {
                error!("Provider call without configuration: {}", service);
                CoreError::Provider(format!("{} is unavailable", service))
            }
            other => {
                error!("Provider failure: {}", other);
                CoreError::Provider("Upstream service error".to_string())
            }
        }
    }
}
