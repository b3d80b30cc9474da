//! Transport trait abstraction for the instrument request/response call

use crate::error::TransportError;
use async_trait::async_trait;
use ito_shared::Response;

/// One request, one response. Implementations do not retry.
#[async_trait]
pub trait InstrumentTransport: Send + Sync {
    /// Send `command` with its raw parameter string and wait for the response
    ///
    /// An instrument-level failure is returned as `Ok` with an error status;
    /// `Err` is reserved for network and framing failures.
    async fn request(&self, command: &str, params: &str) -> Result<Response, TransportError>;

    /// Address of the instrument this transport talks to
    fn address(&self) -> &str;
}
