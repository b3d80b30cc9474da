//! Command pipeline for the console
//!
//! This module handles:
//! - Building the session command catalog from the instrument
//! - Tokenizing argv, typed lines and batch files into queue entries
//! - Dispatching device commands and meta-commands in queue order

pub mod catalog;
mod executor;
pub mod handlers;
pub mod queue;

pub use catalog::{bootstrap, CommandCatalog, MetaCommand};
pub use executor::{CommandExecutor, CommandResult, Injection};
pub use queue::{CommandEntry, CommandQueue};
