use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The error type for session operations
///
/// Read paths never produce these (they degrade to an empty bag or an absent
/// value); write paths and startup return them to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A value could not be serialized for storage in the session bag
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A stored value could not be parsed into the requested shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// The backend failed to write the session
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The configured backend could not be reached at startup
    #[error("Backend initialization error: {0}")]
    BackendInitialization(String),

    /// An application key inside the reserved namespace was written
    #[error("Reserved session key: {0}")]
    ReservedKey(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl SessionError {
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn backend_initialization(msg: impl Into<String>) -> Self {
        Self::BackendInitialization(msg.into())
    }

    pub fn reserved_key(key: impl Into<String>) -> Self {
        Self::ReservedKey(key.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the process should refuse to start because of this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BackendInitialization(_) | Self::Config(_))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::ReservedKey(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(_) | Self::BackendInitialization(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Encoding(_) | Self::Decode(_) | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to clients
    ///
    /// Server-side failures hide their details; the full error is logged.
    fn safe_message(&self) -> String {
        match self {
            Self::ReservedKey(key) => format!("Reserved session key: {}", key),
            Self::Persistence(_) | Self::BackendInitialization(_) => {
                "Session storage unavailable".to_string()
            }
            Self::Encoding(_) | Self::Decode(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!(
            status = status.as_u16(),
            error = %self,
            "Session operation failed"
        );

        let body = Json(ErrorResponse {
            error: self.safe_message(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            SessionError::Decode(err.to_string())
        } else {
            SessionError::Encoding(err.to_string())
        }
    }
}
