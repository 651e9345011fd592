use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Failed to parse message timestamp: {0}")]
    ParseError(String),

    #[error("Invalid input: {0}")]
    InputError(String),

    #[error("{}", format_api_error(.status, .message))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to access summary storage: {0}")]
    StorageError(String),

    #[error("Failed to read chat messages: {0}")]
    ScrapeError(String),

    #[error("Missing configuration: {0}")]
    ConfigError(String),
}

fn format_api_error(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API Error ({code}): {message}"),
        None => format!("API Error: {message}"),
    }
}

impl DigestError {
    /// Errors caused by what the user asked for, as opposed to what went wrong
    /// while serving it.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, DigestError::InputError(_))
    }
}

impl From<reqwest::Error> for DigestError {
    fn from(error: reqwest::Error) -> Self {
        DigestError::HttpError(error.to_string())
    }
}

impl From<std::io::Error> for DigestError {
    fn from(error: std::io::Error) -> Self {
        DigestError::StorageError(error.to_string())
    }
}

impl From<serde_json::Error> for DigestError {
    fn from(error: serde_json::Error) -> Self {
        DigestError::StorageError(format!("invalid JSON: {error}"))
    }
}
