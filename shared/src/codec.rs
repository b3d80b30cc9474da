//! Request/response codec for the instrument command port
//!
//! Requests are single ASCII lines:
//! ```text
//! <command>[ <params>]\r\n
//! ```
//!
//! Responses are framed as:
//! ```text
//! [ status u8 ][ type u8 ][ message length u16 LE ][ content length u32 LE ]
//! [ message bytes ][ content bytes ]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::{Response, ResponseStatus};

/// Size of the fixed response header
pub const HEADER_LEN: usize = 8;

/// Maximum content size (16 MB) to prevent memory exhaustion
pub const MAX_CONTENT_SIZE: u32 = 16 * 1024 * 1024;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Empty command name")]
    EmptyCommand,

    #[error("Request contains a line break: {0:?}")]
    LineBreak(String),

    #[error("Request is not ASCII: {0:?}")]
    NotAscii(String),

    #[error("Content too large: {0} bytes (max: {MAX_CONTENT_SIZE})")]
    ContentTooLarge(u32),
}

/// Encode a request line for the given command and parameter string
pub fn encode_request(command: &str, params: &str) -> Result<Bytes, CodecError> {
    let command = command.trim();
    let params = params.trim();

    if command.is_empty() {
        return Err(CodecError::EmptyCommand);
    }

    for part in [command, params] {
        if part.contains(|c: char| c == '\r' || c == '\n') {
            return Err(CodecError::LineBreak(part.to_string()));
        }
        if !part.is_ascii() {
            return Err(CodecError::NotAscii(part.to_string()));
        }
    }

    let mut buf = BytesMut::with_capacity(command.len() + params.len() + 3);
    buf.put_slice(command.as_bytes());
    if !params.is_empty() {
        buf.put_u8(b' ');
        buf.put_slice(params.as_bytes());
    }
    buf.put_slice(b"\r\n");

    Ok(buf.freeze())
}

/// Encode a response frame (used by fake instruments in tests and tooling)
pub fn encode_response(response: &Response) -> Result<Bytes, CodecError> {
    let message = response.message.as_bytes();
    let content_len = response.content.len();

    if content_len > MAX_CONTENT_SIZE as usize {
        return Err(CodecError::ContentTooLarge(content_len as u32));
    }

    // Message length is a u16 on the wire
    let message = &message[..message.len().min(u16::MAX as usize)];

    let mut buf = BytesMut::with_capacity(HEADER_LEN + message.len() + content_len);
    buf.put_u8(response.status.code());
    buf.put_u8(0);
    buf.put_u16_le(message.len() as u16);
    buf.put_u32_le(content_len as u32);
    buf.put_slice(message);
    buf.put_slice(&response.content);

    Ok(buf.freeze())
}

/// Try to decode one response frame from a buffer
///
/// Returns:
/// - `Ok(Some(response))` if a complete frame was decoded
/// - `Ok(None)` if more data is needed
/// - `Err(...)` if the header is invalid
pub fn decode_response(buf: &mut BytesMut) -> Result<Option<Response>, CodecError> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }

    // Peek at the header without consuming
    let status = buf[0];
    let message_len = u16::from_le_bytes([buf[2], buf[3]]) as usize;
    let content_len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

    if content_len > MAX_CONTENT_SIZE {
        return Err(CodecError::ContentTooLarge(content_len));
    }

    let total_len = HEADER_LEN + message_len + content_len as usize;
    if buf.len() < total_len {
        return Ok(None);
    }

    buf.advance(HEADER_LEN);
    let message = buf.split_to(message_len);
    let content = buf.split_to(content_len as usize).freeze();

    Ok(Some(Response {
        status: ResponseStatus::from_code(status),
        message: String::from_utf8_lossy(&message).into_owned(),
        content,
    }))
}

/// Accumulates bytes read from the socket until a full response frame is available
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Partial frame data being accumulated
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next response from the buffer
    pub fn decode_next(&mut self) -> Result<Option<Response>, CodecError> {
        decode_response(&mut self.buffer)
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
