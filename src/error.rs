use std::time::Duration;
use thiserror::Error;

/// Faults raised inside the engine itself (processors, configuration).
///
/// None of these ever reach a caller of `CommandEngine::process`; the engine
/// turns them into an `error` result at its boundary.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Processor {processor} failed: {message}")]
    Processor {
        processor: &'static str,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures of the language-model gateway. All of them are recoverable.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
}

impl GatewayError {
    /// Whether a second attempt has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout(_) | GatewayError::Transport(_) => true,
            GatewayError::Status { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Malformed(_) | GatewayError::UnsupportedModel(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Transport(format!("timeout: {}", e))
        } else if e.is_decode() {
            GatewayError::Malformed(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
