//! Error types for Donorlink

use reqwest::StatusCode;
use thiserror::Error;

use crate::api::validation::ValidationErrors;
use crate::auth::identity::IdentityError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Not authorized ({0}), session has been closed")]
    Unauthorized(StatusCode),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("No user is currently signed in")]
    NoCurrentUser,

    #[error("Current user has no email address")]
    MissingEmail,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Cannot move donation request from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file not found. Run 'donorlink init' first.")]
    ConfigNotFound,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error closed the session (401/403 from the API)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
