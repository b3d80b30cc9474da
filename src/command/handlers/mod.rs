//! Meta-command handlers
//!
//! Handlers never touch the queue directly. They return the entries they
//! want spliced in, and the executor applies them only when the handler
//! completes.

pub mod clock;
mod config;
mod load;
mod spectrum;

pub use clock::{handle_sync_clock, ClockSource};
pub use config::handle_get_config;
pub use load::handle_load_commands;
pub use spectrum::handle_save_spectrum;

use crate::command::CommandCatalog;
use crate::instrument::Instrument;
use crate::transport::InstrumentTransport;

/// Context passed to meta-command handlers
pub struct HandlerContext<'a> {
    /// Instrument address, used for default file names
    pub address: &'a str,
    /// Raw parameter string of the meta-command
    pub params: &'a str,
    pub transport: &'a dyn InstrumentTransport,
    pub catalog: &'a CommandCatalog,
}

impl<'a> HandlerContext<'a> {
    /// Catalog-checked query helper for this session
    pub fn instrument(&self) -> Instrument<'a> {
        Instrument::new(self.transport, self.catalog)
    }

    /// The parameter string, if the user gave one
    pub fn param(&self) -> Option<&'a str> {
        let params = self.params.trim();
        (!params.is_empty()).then_some(params)
    }
}
