//! Error types for the client: transport failures and malformed payloads.

use thiserror::Error;

/// Anything that stops a connection attempt or ends a live session.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("tls setup failed: {0}")]
    Tls(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidUrl(e.to_string())
    }
}

/// A received message that could not be turned into a snapshot.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("binary frame is not valid UTF-8")]
    Binary,
}
