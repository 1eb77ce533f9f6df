use thiserror::Error;

/// Errors produced by the client library.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// On-device storage I/O failure.
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt persisted JSON.
    #[error("Storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the failure came back as a 4xx/5xx response (as opposed to
    /// never reaching the server).
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
