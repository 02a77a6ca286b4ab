use std::fmt;

/// Errors surfaced by the auth client, gates and screens.
///
/// Transport failures (`Network`, `Timeout`) are transient. `Http` carries the
/// backend's own `{error, reason}` pair when the body had one. `Validation` is
/// produced before any request is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    Config(String),
    Network(String),
    Timeout(String),
    Http {
        status: u16,
        title: String,
        message: String,
    },
    Parse(String),
    Serialization(String),
    Validation(String),
    Storage(String),
}

impl AppError {
    /// Failures worth retrying: transport errors, 5xx and 429.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => true,
            AppError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// True for 401/403 responses.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, AppError::Http { status, .. } if *status == 401 || *status == 403)
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// User-facing title and reason for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            AppError::Http { title, message, .. } => Notice::new(title, message),
            AppError::Validation(message) => Notice::new("Invalid input", message),
            AppError::Network(message) | AppError::Timeout(message) => {
                Notice::new("Connection problem", message)
            }
            AppError::Config(message) => Notice::new("Configuration error", message),
            AppError::Parse(message) | AppError::Serialization(message) => {
                Notice::new("Unexpected response", message)
            }
            AppError::Storage(message) => Notice::new("Storage error", message),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(message) => write!(formatter, "Config error: {message}"),
            AppError::Network(message) => write!(formatter, "Network error: {message}"),
            AppError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            AppError::Http {
                status,
                title,
                message,
            } => {
                write!(formatter, "Request failed ({status}): {title}: {message}")
            }
            AppError::Parse(message) => write!(formatter, "Response error: {message}"),
            AppError::Serialization(message) => {
                write!(formatter, "Request error: {message}")
            }
            AppError::Validation(message) => write!(formatter, "Invalid input: {message}"),
            AppError::Storage(message) => write!(formatter, "Storage error: {message}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Short, transient message shown to the user after a failed action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub reason: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.title, self.reason)
    }
}
