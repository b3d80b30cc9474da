//! Scripted in-memory instrument for tests

use crate::error::TransportError;
use crate::transport::traits::InstrumentTransport;
use async_trait::async_trait;
use ito_shared::Response;
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers requests from a table keyed by lowercase `"command params"`
pub struct MockTransport {
    address: String,
    responses: HashMap<String, Response>,
    unreachable: bool,
    requests: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.into(),
            responses: HashMap::new(),
            unreachable: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A transport whose every request fails to connect
    pub fn unreachable(address: &str) -> Self {
        Self {
            unreachable: true,
            ..Self::new(address)
        }
    }

    /// Script the response for a command line (command plus optional params)
    pub fn respond(mut self, line: &str, response: Response) -> Self {
        self.responses.insert(line.to_lowercase(), response);
        self
    }

    /// Every request received so far, as `(command, params)`
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().expect("mock poisoned").clone()
    }

    /// Commands received so far, without params
    pub fn commands(&self) -> Vec<String> {
        self.requests().into_iter().map(|(command, _)| command).collect()
    }
}

#[async_trait]
impl InstrumentTransport for MockTransport {
    async fn request(&self, command: &str, params: &str) -> Result<Response, TransportError> {
        self.requests
            .lock()
            .expect("mock poisoned")
            .push((command.to_string(), params.to_string()));

        if self.unreachable {
            return Err(TransportError::Connect {
                address: self.address.clone(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            });
        }

        let key = if params.trim().is_empty() {
            command.to_lowercase()
        } else {
            format!("{} {}", command, params.trim()).to_lowercase()
        };

        Ok(self
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::success("OK", bytes::Bytes::new())))
    }

    fn address(&self) -> &str {
        &self.address
    }
}
