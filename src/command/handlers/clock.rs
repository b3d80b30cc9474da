//! Clock synchronisation handlers (`_sync_clock`, `_sync_clock_utc`)

use super::HandlerContext;
use crate::command::{CommandEntry, CommandResult, Injection};
use chrono::{Local, NaiveDateTime, Utc};

/// Sets the instrument clock; takes `YYYY MM DD hh mm ss`
pub const SET_TIME_COMMAND: &str = "#SetInstrumentUtcDateTime";

/// Reads the clock back to confirm the change
pub const GET_TIME_COMMAND: &str = "#GetInstrumentUtcDateTime";

/// Date/time argument order expected by the instrument
const DEVICE_TIME_FORMAT: &str = "%Y %m %d %H %M %S";

/// Which PC clock to copy to the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    Local,
    Utc,
}

impl ClockSource {
    fn now(&self) -> NaiveDateTime {
        match self {
            ClockSource::Local => Local::now().naive_local(),
            ClockSource::Utc => Utc::now().naive_utc(),
        }
    }
}

/// Set-then-get pair that jumps to the front of the queue
pub fn clock_sync_injections(time: NaiveDateTime) -> Vec<Injection> {
    let set = CommandEntry::new(SET_TIME_COMMAND, time.format(DEVICE_TIME_FORMAT).to_string());
    let get = CommandEntry::new(GET_TIME_COMMAND, "");
    vec![Injection::at(0, set), Injection::at(1, get)]
}

/// Handle `_sync_clock` / `_sync_clock_utc`
pub async fn handle_sync_clock(_ctx: &HandlerContext<'_>, source: ClockSource) -> CommandResult {
    let time = source.now();
    CommandResult::Completed {
        message: format!("Instrument clock will be set to {}", time.format("%Y-%m-%d %H:%M:%S")),
        inject: clock_sync_injections(time),
    }
}
