//! Binary response content readers
//!
//! Query responses carry little-endian packed values in their content
//! section. `ContentReader` wraps the content bytes and checks that enough
//! data remains before every read.

use bytes::{Buf, Bytes};
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors raised while decoding response content
#[derive(Error, Debug, PartialEq)]
pub enum ContentError {
    #[error("Content truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Content length {len} is not a multiple of {width}")]
    Misaligned { len: usize, width: usize },

    #[error("Invalid value in content: {0}")]
    InvalidValue(String),
}

/// Sequential little-endian reader over response content
#[derive(Debug, Clone)]
pub struct ContentReader {
    buf: Bytes,
}

impl ContentReader {
    pub fn new(content: Bytes) -> Self {
        Self { buf: content }
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), ContentError> {
        if self.buf.remaining() < needed {
            return Err(ContentError::Truncated {
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, ContentError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, ContentError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32, ContentError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i32(&mut self) -> Result<i32, ContentError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_f32(&mut self) -> Result<f32, ContentError> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    pub fn read_f64(&mut self) -> Result<f64, ContentError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64_le())
    }

    /// Read a string prefixed by a one byte length
    pub fn read_short_string(&mut self) -> Result<String, ContentError> {
        let len = self.read_u8()? as usize;
        self.ensure(len)?;
        let raw = self.buf.split_to(len);
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Read an IPv4 address stored as four octets in network order
    pub fn read_ipv4(&mut self) -> Result<Ipv4Addr, ContentError> {
        self.ensure(4)?;
        let mut octets = [0u8; 4];
        self.buf.copy_to_slice(&mut octets);
        Ok(Ipv4Addr::from(octets))
    }
}

/// Decode content holding a single `i32`
pub fn single_i32(content: &Bytes) -> Result<i32, ContentError> {
    ContentReader::new(content.clone()).read_i32()
}

/// Decode content holding packed `i32` values
pub fn i32_array(content: &Bytes) -> Result<Vec<i32>, ContentError> {
    if content.len() % 4 != 0 {
        return Err(ContentError::Misaligned {
            len: content.len(),
            width: 4,
        });
    }

    let mut reader = ContentReader::new(content.clone());
    let mut values = Vec::with_capacity(content.len() / 4);
    while reader.remaining() > 0 {
        values.push(reader.read_i32()?);
    }
    Ok(values)
}
