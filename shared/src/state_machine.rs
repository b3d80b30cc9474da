//! Console Dispatch State Machine
//!
//! Defines the valid transitions of the command dispatch loop.

/// States of the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for the next queued or typed command
    AwaitingInput,
    /// Checking a command against the catalog
    Validating,
    /// Sending a device command to the instrument
    ExecutingDevice,
    /// Running a local meta-command handler
    ExecutingMeta,
    /// Session finished
    Terminated,
}

/// Events that drive the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEvent {
    /// A command was dequeued or typed
    CommandReady,
    /// The operator asked to leave (or input closed)
    ExitRequested,
    /// Command is a catalog-valid device command
    DeviceCommandAccepted,
    /// Command is a catalog-valid meta-command
    MetaCommandAccepted,
    /// Command is not in the catalog
    CommandRejected,
    /// The current command ran to completion (successfully or not)
    ExecutionFinished,
}

/// Result of a state transition attempt
#[derive(Debug, Clone)]
pub enum TransitionResult {
    /// Transition was valid and state changed
    Success(DispatchState),
    /// Transition was invalid from current state
    Invalid {
        from: DispatchState,
        event: DispatchEvent,
    },
}

/// The dispatch state machine, with per-session counters
#[derive(Debug)]
pub struct DispatchStateMachine {
    current_state: DispatchState,
    executed: u64,
    rejected: u64,
}

impl Default for DispatchStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchStateMachine {
    /// Create a new state machine waiting for input
    pub fn new() -> Self {
        Self {
            current_state: DispatchState::AwaitingInput,
            executed: 0,
            rejected: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> DispatchState {
        self.current_state
    }

    /// Number of commands that were executed (device or meta)
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Number of commands discarded as unknown
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Check if the session is over
    pub fn is_terminated(&self) -> bool {
        self.current_state == DispatchState::Terminated
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: DispatchEvent) -> TransitionResult {
        match self.get_next_state(event) {
            Some(state) => {
                match (self.current_state, event) {
                    (DispatchState::Validating, DispatchEvent::CommandRejected) => {
                        self.rejected += 1;
                    }
                    (_, DispatchEvent::ExecutionFinished) => {
                        self.executed += 1;
                    }
                    _ => {}
                }
                self.current_state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    /// Get the next state for a given event, if the transition is valid
    fn get_next_state(&self, event: DispatchEvent) -> Option<DispatchState> {
        use DispatchEvent::*;
        use DispatchState::*;

        match (self.current_state, event) {
            (AwaitingInput, CommandReady) => Some(Validating),
            (AwaitingInput, ExitRequested) => Some(Terminated),

            (Validating, DeviceCommandAccepted) => Some(ExecutingDevice),
            (Validating, MetaCommandAccepted) => Some(ExecutingMeta),
            (Validating, CommandRejected) => Some(AwaitingInput),

            (ExecutingDevice | ExecutingMeta, ExecutionFinished) => Some(AwaitingInput),

            // Terminated is final
            _ => None,
        }
    }
}
