//! Console configuration and command line arguments

use clap::Parser;
use ito_shared::COMMAND_PORT;
use std::path::PathBuf;
use std::time::Duration;

/// Interactive console for ITO optical measurement instruments
#[derive(Parser, Debug)]
#[command(name = "ito-console")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Instrument IPv4 address; prompted for when omitted
    pub address: Option<String>,

    /// Commands to run before the prompt, e.g. `#GetPeakOffsets 1 _get_config`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub commands: Vec<String>,

    /// Instrument command port
    #[arg(long, default_value_t = COMMAND_PORT)]
    pub port: u16,

    /// Seconds to wait for a connection
    #[arg(long, default_value_t = 5)]
    pub connect_timeout_secs: u64,

    /// Seconds to wait for a response
    #[arg(long, default_value_t = 10)]
    pub read_timeout_secs: u64,

    /// Directory for the session log
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,
}

/// Resolved console configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub address: Option<String>,
    pub commands: Vec<String>,
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub log_dir: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            address: None,
            commands: Vec::new(),
            port: COMMAND_PORT,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            log_dir: PathBuf::from("."),
        }
    }
}

impl From<Args> for ConsoleConfig {
    fn from(args: Args) -> Self {
        Self {
            address: args.address.map(|a| a.trim().to_string()),
            commands: args.commands,
            port: args.port,
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            read_timeout: Duration::from_secs(args.read_timeout_secs),
            log_dir: args.log_dir,
        }
    }
}

/// Check for a dotted IPv4 address: four numeric groups, each 0..=255
pub fn validate_address(address: &str) -> bool {
    let groups: Vec<&str> = address.split('.').collect();
    if groups.len() != 4 {
        return false;
    }

    groups.iter().all(|group| {
        !group.is_empty()
            && group.chars().all(|c| c.is_ascii_digit())
            && group.parse::<u32>().map_or(false, |value| value <= 255)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("10.0.0.55"));
        assert!(validate_address("255.255.255.0"));
        assert!(validate_address("0.0.0.0"));

        assert!(!validate_address("10.0.0"));
        assert!(!validate_address("10.0.0.55.1"));
        assert!(!validate_address("10.0.0.256"));
        assert!(!validate_address("10.0..55"));
        assert!(!validate_address("10.0.0.x"));
        assert!(!validate_address("10.0.0.-1"));
        assert!(!validate_address("10.0.0.99999999999"));
        assert!(!validate_address(""));
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["ito-console"]);
        let config = ConsoleConfig::from(args);
        let defaults = ConsoleConfig::default();

        assert_eq!(config.address, None);
        assert!(config.commands.is_empty());
        assert_eq!(config.port, defaults.port);
        assert_eq!(config.connect_timeout, defaults.connect_timeout);
        assert_eq!(config.read_timeout, defaults.read_timeout);
        assert_eq!(config.log_dir, defaults.log_dir);
    }

    #[test]
    fn test_args_with_commands() {
        let args = Args::parse_from([
            "ito-console",
            "--port",
            "5000",
            "10.0.0.55",
            "#SetChannelDetectionSettingId",
            "1",
            "-3",
            "_get_config",
        ]);
        let config = ConsoleConfig::from(args);

        assert_eq!(config.address.as_deref(), Some("10.0.0.55"));
        assert_eq!(config.port, 5000);
        assert_eq!(
            config.commands,
            vec!["#SetChannelDetectionSettingId", "1", "-3", "_get_config"]
        );
    }
}
