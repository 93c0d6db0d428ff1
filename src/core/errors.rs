// src/core/errors.rs

use thiserror::Error;

/// Failures surfaced to the user while turning input into command invocations.
///
/// None of these is fatal: the controller displays them and carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    /// No registry entry matches the typed command.
    #[error("Unknown command '{0}'.")]
    UnknownCommand(String),
    /// The caller may not run the command.
    #[error("You are not allowed to use '{command}'.")]
    Unauthorized {
        /// Canonical command name.
        command: String,
        /// Subject reported by the authorization collaborator.
        subject: Option<String>,
    },
    /// A step of the active multi-step command failed.
    #[error("'{command}' failed at step {step}: {reason}")]
    StepFailure {
        /// Canonical command name.
        command: String,
        /// Step that failed.
        step: usize,
        /// Handler-supplied reason.
        reason: String,
    },
    /// Input arrived while a step or a resolution was still in flight.
    #[error("Input ignored while the previous command is still running.")]
    InputLocked,
    /// The command handler failed unexpectedly. All volatile state was reset.
    #[error("Internal fault while running '{command}': {message}")]
    InternalFault {
        /// Command that was running.
        command: String,
        /// Underlying error message.
        message: String,
    },
}
