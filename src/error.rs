//! Error types for the console
//!
//! Only `SessionError` is fatal: it ends the process before the dispatch
//! loop starts. Everything raised inside the loop is reported and dropped.

use ito_shared::codec::CodecError;
use ito_shared::content::ContentError;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the instrument at the network/protocol level
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Cannot connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection closed before a full response was received")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Codec(#[from] CodecError),
}

/// Fatal conditions detected before the session starts
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Wrong IP '{0}'")]
    InvalidAddress(String),

    #[error("Can't connect to IP '{address}': {reason}")]
    ConnectFailure { address: String, reason: String },

    #[error("Can't read command list from IP '{address}': {reason}")]
    CatalogFetchFailure { address: String, reason: String },
}

/// Failure of a typed instrument query
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{command} failed: {message}")]
    Instrument { command: String, message: String },

    #[error("{0} is not supported by this instrument")]
    Unsupported(String),

    #[error("Malformed response to {command}: {source}")]
    Malformed {
        command: String,
        #[source]
        source: ContentError,
    },
}
