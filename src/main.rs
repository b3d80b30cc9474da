mod command;
mod config;
mod error;
mod instrument;
mod logging;
mod transport;

use anyhow::Result;
use clap::Parser;
use command::{bootstrap, CommandExecutor, CommandQueue, MetaCommand};
use config::{validate_address, Args, ConsoleConfig};
use error::SessionError;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use transport::TcpTransport;

use tracing::{error, info};

const ADDRESS_PROMPT: &str = "Enter ITO IPv4 (eg. 10.0.0.55)>>";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = ConsoleConfig::from(Args::parse());
    let (guard, log_path) = logging::init(&config.log_dir)?;

    info!("Program starts v.{}", env!("CARGO_PKG_VERSION"));
    info!("{:?}", std::env::args().collect::<Vec<_>>());
    info!("Session log: {}", log_path.display());

    print_banner();

    let mut input = BufReader::new(tokio::io::stdin());
    if let Err(e) = run(config, &mut input).await {
        println!("{}", e);
        error!(target: logging::ECHO_TARGET, "{:#}", e);
        // Flush the session log before exiting
        drop(guard);
        std::process::exit(1);
    }

    info!("Program finished");
    Ok(())
}

fn print_banner() {
    println!("Usage: ito-console [ip] [command] [command] [command]...");
    println!("    ip - IPv4 address of ITO, like 10.0.0.55");
    println!("    command - one or more commands to send to ITO separated by a space,");
    println!("              like '#GetBoardTemperature #GetFirmwareVersion'");
    println!("Hyperion commands begin with #.");
    println!("    Use #help for complete list of valid commands.");
    println!("    Type \"exit\" to close the console.");
    println!("Console built-in commands:");
    for meta in MetaCommand::ALL {
        println!("    {} - {}", meta.name(), meta.description());
    }
    println!();
}

/// Read the instrument address from the operator
async fn prompt_address<R>(input: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    print!("{}", ADDRESS_PROMPT);
    std::io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line).await?;
    let address = line.trim().to_string();
    info!("{}{}", ADDRESS_PROMPT, address);
    Ok(address)
}

/// Connect, bootstrap the session and run the dispatch loop
async fn run<R>(config: ConsoleConfig, input: &mut R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let address = match config.address {
        Some(address) => address,
        None => prompt_address(input).await?,
    };

    if !validate_address(&address) {
        return Err(SessionError::InvalidAddress(address).into());
    }

    let transport = TcpTransport::new(
        address,
        config.port,
        config.connect_timeout,
        config.read_timeout,
    );

    let session = bootstrap(&transport).await?;
    info!(
        "{} device commands available",
        session.catalog.device_command_count()
    );

    let queue = CommandQueue::from_argv(&config.commands, &session.catalog);
    if !queue.is_empty() {
        info!("{} commands queued from arguments", queue.len());
        for entry in queue.iter() {
            info!("  {}", entry);
        }
    }

    let mut executor = CommandExecutor::new(transport, session.catalog, &session.identity, queue);
    executor.run(input).await?;

    Ok(())
}
