//! ITO Shared Protocol Types
//!
//! This crate provides the wire protocol types and codec used by the console
//! to talk to an ITO optical measurement instrument over its TCP command port.

pub mod codec;
pub mod content;
pub mod state_machine;

use bytes::Bytes;

/// TCP port the instrument accepts command requests on
pub const COMMAND_PORT: u16 = 51971;

/// Sigil that starts every device command
pub const DEVICE_SIGIL: char = '#';

/// Sigil that starts every console meta-command
pub const META_SIGIL: char = '_';

/// Physical constants for converting peak offset delays to fiber distance
pub mod optics {
    /// Speed of light in vacuum, m/s
    pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

    /// Group index of refraction of the sensing fiber
    pub const FIBER_REFRACTIVE_INDEX: f64 = 1.4682;

    /// Convert a round-trip delay in nanoseconds to a one-way distance in metres
    pub fn delay_ns_to_metres(delay_ns: i32) -> f64 {
        f64::from(delay_ns) * 1e-9 * SPEED_OF_LIGHT / 2.0 / FIBER_REFRACTIVE_INDEX
    }
}

/// Status byte of a response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Command executed
    Success,
    /// Instrument refused or failed the command (raw status code kept)
    InstrumentError(u8),
}

impl ResponseStatus {
    /// Map the raw status byte from the frame header
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ResponseStatus::Success,
            other => ResponseStatus::InstrumentError(other),
        }
    }

    /// Raw status byte as sent on the wire
    pub fn code(&self) -> u8 {
        match self {
            ResponseStatus::Success => 0,
            ResponseStatus::InstrumentError(code) => *code,
        }
    }
}

/// A decoded instrument response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: ResponseStatus,
    /// Human readable text
    pub message: String,
    /// Raw binary payload
    pub content: Bytes,
}

impl Response {
    /// Create a successful response
    pub fn success(message: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            content: content.into(),
        }
    }

    /// Create an instrument error response
    pub fn instrument_error(code: u8, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::InstrumentError(code),
            message: message.into(),
            content: Bytes::new(),
        }
    }

    /// Check if the instrument accepted the command
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Error description when the instrument reported a failure
    pub fn error(&self) -> Option<&str> {
        match self.status {
            ResponseStatus::Success => None,
            ResponseStatus::InstrumentError(_) => Some(self.message.trim()),
        }
    }

    /// Content decoded as text, falling back to the message when the content is empty
    pub fn text(&self) -> String {
        let content = String::from_utf8_lossy(&self.content);
        let content = content.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        if content.is_empty() {
            self.message.trim().to_string()
        } else {
            content.to_string()
        }
    }
}
