//! Command executor - the dispatch loop of the console
//!
//! Pulls one entry at a time from the queue (prompting when it is empty),
//! validates it against the catalog and runs it. No error inside the loop
//! ends the session; only `exit` or closed input does.

use super::catalog::{CommandCatalog, CommandKind, MetaCommand};
use super::handlers::{self, ClockSource, HandlerContext};
use super::queue::{CommandEntry, CommandQueue};
use crate::logging::ECHO_TARGET;
use crate::transport::InstrumentTransport;
use ito_shared::state_machine::{DispatchEvent, DispatchStateMachine, TransitionResult};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

/// Typed line that ends the session (prefix match)
const EXIT_COMMAND: &str = "exit";

/// Result of meta-command execution
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Handler finished; `inject` is spliced into the queue in order
    Completed {
        message: String,
        inject: Vec<Injection>,
    },
    /// Handler ran but failed (I/O, instrument or transport error)
    Failed { message: String },
    /// Handler refused to run (bad parameters)
    Rejected { message: String },
}

/// A follow-up command to splice into the queue
#[derive(Debug, Clone, PartialEq)]
pub struct Injection {
    pub index: usize,
    pub entry: CommandEntry,
}

impl Injection {
    pub fn at(index: usize, entry: CommandEntry) -> Self {
        Self { index, entry }
    }
}

/// Print a line for the operator and record it in the session log
fn report(message: &str) {
    println!("{}", message);
    info!(target: ECHO_TARGET, "{}", message);
}

fn report_error(message: &str) {
    println!("{}", message);
    error!(target: ECHO_TARGET, "{}", message);
}

/// Owns the session state and runs the dispatch loop
pub struct CommandExecutor<T> {
    transport: T,
    catalog: CommandCatalog,
    queue: CommandQueue,
    prompt: String,
    fsm: DispatchStateMachine,
}

impl<T: InstrumentTransport + 'static> CommandExecutor<T> {
    /// Create a new executor for a bootstrapped session
    pub fn new(transport: T, catalog: CommandCatalog, identity: &str, queue: CommandQueue) -> Self {
        Self {
            transport,
            catalog,
            queue,
            prompt: format!("hyp:{}>>", identity),
            fsm: DispatchStateMachine::new(),
        }
    }

    fn transition(&mut self, event: DispatchEvent) {
        if let TransitionResult::Invalid { from, event } = self.fsm.process_event(event) {
            warn!("Ignoring {:?} in state {:?}", event, from);
        }
    }

    /// Run until the operator exits or input closes
    pub async fn run<R>(&mut self, input: &mut R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        while !self.fsm.is_terminated() {
            match self.next_command(input).await? {
                Some(entry) => self.dispatch(entry).await,
                None => self.transition(DispatchEvent::ExitRequested),
            }
        }

        info!(
            "Session finished: {} commands executed, {} skipped",
            self.fsm.executed(),
            self.fsm.rejected()
        );
        Ok(())
    }

    /// Next queued entry, or a typed one when the queue is empty
    ///
    /// Returns `None` when the operator typed `exit` or input closed.
    async fn next_command<R>(&mut self, input: &mut R) -> std::io::Result<Option<CommandEntry>>
    where
        R: AsyncBufRead + Unpin,
    {
        if let Some(entry) = self.queue.pop_front() {
            return Ok(Some(entry));
        }

        loop {
            print!("{}", self.prompt);
            std::io::stdout().flush()?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                println!();
                info!("Input closed");
                return Ok(None);
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            info!("{}{}", self.prompt, line);
            if line.to_lowercase().starts_with(EXIT_COMMAND) {
                return Ok(None);
            }
            // Only the name is case-folded; params such as file paths stay verbatim
            return Ok(Some(CommandEntry::from_line(line)));
        }
    }

    /// Validate and execute one entry
    pub async fn dispatch(&mut self, entry: CommandEntry) {
        self.transition(DispatchEvent::CommandReady);

        match self.catalog.classify(&entry) {
            Some(CommandKind::Device) => {
                self.transition(DispatchEvent::DeviceCommandAccepted);
                self.execute_device(&entry).await;
                self.transition(DispatchEvent::ExecutionFinished);
            }
            Some(CommandKind::Meta(meta)) => {
                self.transition(DispatchEvent::MetaCommandAccepted);
                self.execute_meta(meta, &entry).await;
                self.transition(DispatchEvent::ExecutionFinished);
            }
            None => {
                report(&format!(
                    "Command \"{}\" skipped, not in the list of #GetCommandNames",
                    entry
                ));
                self.transition(DispatchEvent::CommandRejected);
            }
        }
    }

    async fn execute_device(&self, entry: &CommandEntry) {
        report(&format!(">> {}", entry));

        match self.transport.request(entry.name(), entry.params()).await {
            Ok(response) => match response.error() {
                None => report(&format!("<< {}\n", response.message.trim_end())),
                Some(message) => report_error(&format!("Instrument error {}", message)),
            },
            Err(e) => report_error(&format!("Transport error {}", e)),
        }
    }

    async fn execute_meta(&mut self, meta: MetaCommand, entry: &CommandEntry) {
        info!("{}", entry);
        report(meta.description());

        let ctx = HandlerContext {
            address: self.transport.address(),
            params: entry.params(),
            transport: &self.transport,
            catalog: &self.catalog,
        };

        let result = match meta {
            MetaCommand::SyncClock => handlers::handle_sync_clock(&ctx, ClockSource::Local).await,
            MetaCommand::SyncClockUtc => handlers::handle_sync_clock(&ctx, ClockSource::Utc).await,
            MetaCommand::SaveSpectrum => handlers::handle_save_spectrum(&ctx).await,
            MetaCommand::LoadCommands => handlers::handle_load_commands(&ctx).await,
            MetaCommand::GetConfig => handlers::handle_get_config(&ctx).await,
        };

        self.apply(result);
    }

    fn apply(&mut self, result: CommandResult) {
        match result {
            CommandResult::Completed { message, inject } => {
                report(&message);
                for injection in inject {
                    self.queue.insert_at(injection.index, injection.entry);
                }
            }
            CommandResult::Failed { message } => report_error(&message),
            CommandResult::Rejected { message } => report_error(&message),
        }
    }
}

#[cfg(test)]
impl<T> CommandExecutor<T> {
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> ito_shared::state_machine::DispatchState {
        self.fsm.state()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handlers::clock::{GET_TIME_COMMAND, SET_TIME_COMMAND};
    use crate::instrument::fixtures;
    use crate::transport::mock::MockTransport;
    use ito_shared::state_machine::DispatchState;
    use ito_shared::Response;

    fn executor(transport: MockTransport) -> CommandExecutor<MockTransport> {
        CommandExecutor::new(transport, fixtures::full_catalog(), "ITO-0042", CommandQueue::new())
    }

    fn queued(executor: &CommandExecutor<MockTransport>) -> Vec<String> {
        executor.queue().iter().map(|e| e.name().to_string()).collect()
    }

    #[test]
    fn test_prompt_uses_identity() {
        let executor = executor(MockTransport::new("10.0.0.55"));
        assert_eq!(executor.prompt(), "hyp:ITO-0042>>");
        assert_eq!(executor.state(), DispatchState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_unknown_command_never_reaches_transport() {
        let mut executor = executor(MockTransport::new("10.0.0.55"));
        executor.dispatch(CommandEntry::from_line("#Frobnicate 1 2")).await;

        assert!(executor.transport().requests().is_empty());
        assert_eq!(executor.state(), DispatchState::AwaitingInput);
        assert_eq!(executor.fsm.rejected(), 1);
    }

    #[tokio::test]
    async fn test_device_command_sent_with_params() {
        let mut executor = executor(fixtures::two_channel_instrument());
        executor
            .dispatch(CommandEntry::from_line("#getpeakoffsets 1"))
            .await;

        assert_eq!(
            executor.transport().requests(),
            vec![("#getpeakoffsets".to_string(), "1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_sync_clock_jumps_queue() {
        let mut executor = executor(MockTransport::new("10.0.0.55"));
        executor.queue.push_back(CommandEntry::from_line("#getboardtemperature"));
        executor.queue.push_back(CommandEntry::from_line("#help"));

        executor.dispatch(CommandEntry::from_line("_sync_clock")).await;

        assert_eq!(
            queued(&executor),
            vec![
                SET_TIME_COMMAND.to_lowercase(),
                GET_TIME_COMMAND.to_lowercase(),
                "#getboardtemperature".to_string(),
                "#help".to_string(),
            ]
        );
        assert!(executor.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_sync_clock_end_to_end() {
        let mut executor = executor(MockTransport::new("10.0.0.55"));
        let mut input: &[u8] = b"_sync_clock_utc\nexit\n";

        executor.run(&mut input).await.expect("run failed");

        let requests = executor.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "#setinstrumentutcdatetime");
        assert_eq!(requests[0].1.split_whitespace().count(), 6);
        assert_eq!(requests[1].0, "#getinstrumentutcdatetime");
        assert_eq!(executor.fsm.rejected(), 0);
        assert_eq!(executor.state(), DispatchState::Terminated);
    }

    #[tokio::test]
    async fn test_queue_runs_before_prompt_and_errors_continue() {
        let transport = MockTransport::new("10.0.0.55")
            .respond("#GetBoardTemperature", Response::instrument_error(3, "sensor fault"));
        let catalog = fixtures::full_catalog();
        let queue = CommandQueue::from_argv(["#GetBoardTemperature", "#GetSerialNumber"], &catalog);
        let mut executor = CommandExecutor::new(transport, catalog, "ITO-0042", queue);
        let mut input: &[u8] = b"\n  \n#GetDutChannelCount\n";

        executor.run(&mut input).await.expect("run failed");

        assert_eq!(
            executor.transport().commands(),
            vec!["#getboardtemperature", "#getserialnumber", "#getdutchannelcount"]
        );
        assert_eq!(executor.state(), DispatchState::Terminated);
    }

    #[tokio::test]
    async fn test_exit_bypasses_validation() {
        let mut executor = executor(MockTransport::new("10.0.0.55"));
        let mut input: &[u8] = b"EXIT now\n#getserialnumber\n";

        executor.run(&mut input).await.expect("run failed");

        assert!(executor.transport().requests().is_empty());
        assert_eq!(executor.fsm.executed(), 0);
    }

    #[tokio::test]
    async fn test_failed_meta_command_injects_nothing() {
        let mut executor = executor(MockTransport::new("10.0.0.55"));
        executor.queue.push_back(CommandEntry::from_line("#help"));

        executor.dispatch(CommandEntry::from_line("_load_commands")).await;
        executor
            .dispatch(CommandEntry::from_line("_load_commands /nonexistent/batch.txt"))
            .await;

        assert_eq!(queued(&executor), vec!["#help"]);
        assert_eq!(executor.state(), DispatchState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_load_commands_end_to_end() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("batch.txt");
        std::fs::write(
            &path,
            "#GetSerialNumber ; first\n#GetDutChannelCount\n#GetBoardTemperature\n",
        )
        .expect("write batch");

        let mut executor = executor(fixtures::two_channel_instrument());
        let script = format!("_load_commands {}\nexit\n", path.display());
        let mut input = script.as_bytes();

        executor.run(&mut input).await.expect("run failed");

        // Each line goes to position 1 in turn
        assert_eq!(
            executor.transport().commands(),
            vec!["#getserialnumber", "#getboardtemperature", "#getdutchannelcount"]
        );
    }
}
