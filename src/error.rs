//! Error types for the client.
//!
//! One enum covers every failure the crate can surface. Response timeouts
//! are deliberately not represented here: a robot that stays silent is a
//! routine operating condition, reported as the `None` arm of an `Option`
//! rather than an error (callers poll around it).

use thiserror::Error;

/// Convenience alias for results using the client error type.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The reply body was not JSON, or was missing a required top-level key.
    /// A malformed reply means the robot and client have lost
    /// synchronization, so this is never recovered silently.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The capability file is unreadable as a capability document.
    #[error("capability store corrupt: {0}")]
    StoreCorrupt(String),

    /// Transport-level failure. Propagates immediately; there is no retry
    /// and no automatic reconnect.
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
