use thiserror::Error;

/// Transport-level failure of a cross-process call.
///
/// The client never retries these; they are surfaced to the caller as
/// [`ClientError::Remote`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("remote call failed: {message}")]
pub struct RemoteError {
    /// Transport-supplied failure description.
    pub message: String,
}

impl RemoteError {
    /// Wrap a transport failure description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure to decode one wire-encoded event record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is not valid JSON or lacks a required field.
    #[error("event payload is not a valid wire object: {0}")]
    Malformed(String),
    /// A timestamp field does not match the fixed wire format.
    #[error("field '{field}' holds unparseable timestamp '{value}'")]
    Timestamp {
        /// Wire field name (`beg` or `end`).
        field: &'static str,
        /// Offending field content.
        value: String,
    },
}

/// Stable error surface of the client library.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A remote-proxied operation was attempted without a live connection.
    ///
    /// Callers must await [`crate::types::ClientEvent::Ready`] first.
    #[error("not connected to the companion service")]
    NotConnected,
    /// A cross-process call failed at the transport level.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// A wire-encoded event record could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The bind request could not even be issued; fatal for that attempt.
    #[error("bind request could not be started: {message}")]
    Setup {
        /// Platform-supplied failure description.
        message: String,
    },
}
