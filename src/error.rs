use thiserror::Error;

/// Type alias for Result with ResponderError
pub type Result<T> = std::result::Result<T, ResponderError>;

/// Coarse classification of a failure, deciding how far it may travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Startup cannot continue without working credentials
    Auth,
    /// A single remote operation failed; callers degrade to a conservative value
    RemoteCall,
    /// Message content could not be interpreted; only that message is abandoned
    Parse,
}

/// Error types for the vacation responder
#[derive(Error, Debug)]
pub enum ResponderError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Message content could not be parsed
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// Label-related errors
    #[error("Label error: {0}")]
    LabelError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ResponderError {
    /// Which of the three failure classes this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResponderError::AuthError(_)
            | ResponderError::ConfigError(_)
            | ResponderError::IoError(_)
            | ResponderError::SerializationError(_) => ErrorKind::Auth,
            ResponderError::InvalidMessageFormat(_) => ErrorKind::Parse,
            _ => ErrorKind::RemoteCall,
        }
    }

    /// Classify a failed HTTP status from the Gmail API
    fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            429 => ResponderError::RateLimitExceeded(message),
            404 => ResponderError::NotFound(message),
            400 => ResponderError::BadRequest(message),
            401 => ResponderError::AuthError(message),
            403 => ResponderError::Forbidden(message),
            500..=599 => ResponderError::ServerError {
                status: status_code,
                message,
            },
            _ => ResponderError::ApiError(message),
        }
    }
}

impl From<google_gmail1::Error> for ResponderError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let message = format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                );
                ResponderError::from_status(status.as_u16(), message)
            }
            // Non-2xx responses with a JSON body: {"error": {"code": 404, "message": ...}}
            google_gmail1::Error::BadRequest(ref body) => {
                let code = body["error"]["code"].as_u64().map(|c| c as u16);
                let message = body["error"]["message"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| body.to_string());
                match code {
                    Some(code) => {
                        ResponderError::from_status(code, format!("HTTP {}: {}", code, message))
                    }
                    None => ResponderError::BadRequest(message),
                }
            }
            google_gmail1::Error::HttpError(ref err) => {
                ResponderError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => ResponderError::NetworkError(err.to_string()),
            // Token refresh failures surface here once the hub is running
            google_gmail1::Error::MissingToken(err) => {
                ResponderError::AuthError(format!("Access token unavailable: {}", err))
            }
            _ => ResponderError::ApiError(error.to_string()),
        }
    }
}
