use crate::components::meetings::models::Provider;
use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the calendar core
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Validation error: {0}")]
    #[diagnostic(code(estatecal::validation))]
    Validation(String),

    #[error("Meeting provider {0} is not configured")]
    #[diagnostic(
        code(estatecal::provider_not_configured),
        help("Set the provider client id in the environment")
    )]
    ProviderNotConfigured(Provider),

    #[error("Not signed in to meeting provider {0}")]
    #[diagnostic(code(estatecal::provider_not_signed_in))]
    ProviderNotSignedIn(Provider),

    #[error("Meeting provider {provider} request failed: {message}")]
    #[diagnostic(code(estatecal::provider_request))]
    ProviderRequest { provider: Provider, message: String },

    #[error("Failed to fetch calendar events: {0}")]
    #[diagnostic(code(estatecal::fetch))]
    Fetch(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(estatecal::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(estatecal::config))]
    Config(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(estatecal::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(estatecal::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(estatecal::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(estatecal::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type CalendarResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create event fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::Fetch(message.to_string())
}

/// Helper to create provider request errors
pub fn provider_request_error(provider: Provider, message: &str) -> Error {
    Error::ProviderRequest {
        provider,
        message: message.to_string(),
    }
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}
