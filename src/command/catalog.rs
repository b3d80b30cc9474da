//! Command catalog - the set of command names valid for this session
//!
//! Device command names come from the instrument itself (`#GetCommandNames`),
//! so the console follows whatever the firmware supports. Meta-command names
//! are always present.

use super::queue::CommandEntry;
use crate::error::SessionError;
use crate::transport::InstrumentTransport;
use ito_shared::{DEVICE_SIGIL, META_SIGIL};
use std::collections::HashSet;
use tracing::{debug, info};

/// First request of a session, confirms the instrument answers at all
pub const SERIAL_NUMBER_COMMAND: &str = "#GetSerialNumber";

/// Lists every device command supported by the firmware
pub const COMMAND_NAMES_COMMAND: &str = "#GetCommandNames";

/// Shortest device command name, used when the catalog has none
const FALLBACK_MIN_NAME_LEN: usize = "#help".len();

/// Console commands implemented locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaCommand {
    SyncClock,
    SyncClockUtc,
    SaveSpectrum,
    LoadCommands,
    GetConfig,
}

impl MetaCommand {
    /// Every meta-command, in the order the banner lists them
    pub const ALL: [MetaCommand; 5] = [
        MetaCommand::SyncClock,
        MetaCommand::SyncClockUtc,
        MetaCommand::SaveSpectrum,
        MetaCommand::LoadCommands,
        MetaCommand::GetConfig,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetaCommand::SyncClock => "_sync_clock",
            MetaCommand::SyncClockUtc => "_sync_clock_utc",
            MetaCommand::SaveSpectrum => "_save_spectrum",
            MetaCommand::LoadCommands => "_load_commands",
            MetaCommand::GetConfig => "_get_config",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetaCommand::SyncClock => "set ITO clock by this PC time",
            MetaCommand::SyncClockUtc => "set ITO clock by this PC UTC-time (no time zone)",
            MetaCommand::SaveSpectrum => "save full spectrum to file",
            MetaCommand::LoadCommands => {
                "load commands sequence from file (each command in new line)"
            }
            MetaCommand::GetConfig => "read all important commands",
        }
    }

    /// Look up a meta-command by its (case-insensitive) name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|meta| meta.name() == name)
    }
}

/// How a validated command gets executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Sent to the instrument as is
    Device,
    /// Handled by the console
    Meta(MetaCommand),
}

/// Lowercase command names valid for the current session
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    names: HashSet<String>,
}

impl CommandCatalog {
    /// Build a catalog from device command names plus all meta-commands
    pub fn from_device_names<I, S>(device_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: HashSet<String> = device_names
            .into_iter()
            .map(|name| name.as_ref().trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        names.extend(MetaCommand::ALL.iter().map(|meta| meta.name().to_string()));
        Self { names }
    }

    /// Parse the line-delimited `#GetCommandNames` message
    pub fn from_command_names_message(message: &str) -> Self {
        Self::from_device_names(message.lines())
    }

    /// Case-insensitive membership test
    pub fn is_valid(&self, token: &str) -> bool {
        self.names.contains(&token.to_lowercase())
    }

    /// Resolve an entry to the way it should be executed, if it is valid
    pub fn classify(&self, entry: &CommandEntry) -> Option<CommandKind> {
        let name = entry.name();
        if !self.is_valid(name) {
            return None;
        }

        if name.starts_with(DEVICE_SIGIL) {
            Some(CommandKind::Device)
        } else if name.starts_with(META_SIGIL) {
            MetaCommand::from_name(name).map(CommandKind::Meta)
        } else {
            None
        }
    }

    /// Length of the shortest device command name in the catalog
    pub fn min_device_name_len(&self) -> usize {
        self.names
            .iter()
            .filter(|name| name.starts_with(DEVICE_SIGIL))
            .map(|name| name.len())
            .min()
            .unwrap_or(FALLBACK_MIN_NAME_LEN)
    }

    /// Number of device commands reported by the instrument
    pub fn device_command_count(&self) -> usize {
        self.names
            .iter()
            .filter(|name| name.starts_with(DEVICE_SIGIL))
            .count()
    }
}

/// Result of the connection handshake
#[derive(Debug)]
pub struct Bootstrap {
    pub catalog: CommandCatalog,
    /// Instrument serial number, used for the prompt
    pub identity: String,
}

/// Check the instrument answers and fetch its command list
///
/// Both failures are fatal for the session; nothing is retried.
pub async fn bootstrap(transport: &dyn InstrumentTransport) -> Result<Bootstrap, SessionError> {
    let address = transport.address().to_string();
    info!("Connect to {}", address);

    let serial = match transport.request(SERIAL_NUMBER_COMMAND, "").await {
        Ok(response) => match response.error() {
            None => response,
            Some(message) => {
                return Err(SessionError::ConnectFailure {
                    address,
                    reason: message.to_string(),
                })
            }
        },
        Err(e) => {
            debug!("Serial number request failed: {}", e);
            return Err(SessionError::ConnectFailure {
                address,
                reason: e.to_string(),
            });
        }
    };
    println!("{}", serial.message.trim());
    info!("{}", serial.message.trim());

    let names = match transport.request(COMMAND_NAMES_COMMAND, "").await {
        Ok(response) => match response.error() {
            None => response,
            Some(message) => {
                return Err(SessionError::CatalogFetchFailure {
                    address,
                    reason: message.to_string(),
                })
            }
        },
        Err(e) => {
            return Err(SessionError::CatalogFetchFailure {
                address,
                reason: e.to_string(),
            })
        }
    };

    let catalog = CommandCatalog::from_command_names_message(&names.message);
    info!(
        "Instrument reports {} device commands",
        catalog.device_command_count()
    );

    Ok(Bootstrap {
        catalog,
        identity: serial.text(),
    })
}
