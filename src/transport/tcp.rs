//! TCP transport implementation for the instrument command port

use crate::error::TransportError;
use crate::transport::traits::InstrumentTransport;
use async_trait::async_trait;
use ito_shared::codec::{self, FrameDecoder};
use ito_shared::Response;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Opens a fresh connection for every request, like the vendor client does
pub struct TcpTransport {
    address: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl TcpTransport {
    /// Create a new TCP transport for an instrument address
    pub fn new(address: String, port: u16, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            address,
            port,
            connect_timeout,
            read_timeout,
        }
    }

    async fn connect(&self) -> Result<TcpStream, TransportError> {
        let target = (self.address.as_str(), self.port);
        match timeout(self.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TransportError::Connect {
                address: format!("{}:{}", self.address, self.port),
                source,
            }),
            Err(_) => Err(TransportError::Timeout(self.connect_timeout)),
        }
    }

    async fn read_response(stream: &mut TcpStream) -> Result<Response, TransportError> {
        let mut decoder = FrameDecoder::new();
        let mut buf = vec![0u8; 4096];

        loop {
            if let Some(response) = decoder.decode_next()? {
                return Ok(response);
            }

            match stream.read(&mut buf).await? {
                0 => return Err(TransportError::Closed),
                n => decoder.extend(&buf[..n]),
            }
        }
    }
}

#[async_trait]
impl InstrumentTransport for TcpTransport {
    async fn request(&self, command: &str, params: &str) -> Result<Response, TransportError> {
        let request = codec::encode_request(command, params)?;
        let mut stream = self.connect().await?;

        stream.write_all(&request).await?;
        debug!("Sent {} bytes to {}", request.len(), self.address);

        let response = match timeout(self.read_timeout, Self::read_response(&mut stream)).await {
            Ok(result) => result?,
            Err(_) => return Err(TransportError::Timeout(self.read_timeout)),
        };

        if let Err(e) = stream.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.address, e);
        }

        debug!(
            "Received response: status={:?} message={}B content={}B",
            response.status,
            response.message.len(),
            response.content.len()
        );
        Ok(response)
    }

    fn address(&self) -> &str {
        &self.address
    }
}
