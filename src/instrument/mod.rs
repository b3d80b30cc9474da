//! Instrument Query Module
//!
//! Typed, read-only queries built on top of the raw transport, used by the
//! meta-commands that need more than one device round trip.

mod queries;
pub mod types;

#[cfg(test)]
pub mod fixtures;

pub use queries::Instrument;
pub use types::{DetectionSetting, InstrumentConfig, PeakMode, FACTORY_PRESET_ID};
