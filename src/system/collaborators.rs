// src/system/collaborators.rs

//! Contracts of everything the terminal core talks to but does not own.
//!
//! Requests that may be answered later carry a [`RequestId`]; their answers are
//! fed back through the controller's `on_*` methods.

use crate::core::pending::{Reply, RequestId};
use crate::core::session::StepOutcome;
use crate::models::{AutocompleteKind, StyleHint};
use anyhow::Result;
use std::fmt;

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    /// The command may run.
    pub allowed: bool,
    /// Who the decision applies to, if the collaborator reports it.
    pub subject: Option<String>,
}

impl AuthDecision {
    /// An unconditional approval.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            subject: None,
        }
    }

    /// An unconditional denial.
    pub fn deny() -> Self {
        Self {
            allowed: false,
            subject: None,
        }
    }
}

/// Decides whether a command may run.
pub trait Authorizer {
    /// Checks `command`. A `Reply::Pending` answer is delivered later through
    /// `InputController::on_authorization` under `id`.
    fn check_allowed(&mut self, id: RequestId, command: &str) -> Reply<AuthDecision>;
}

/// Remote name lookup for user and room completion.
pub trait RemoteLookup {
    /// Starts a lookup. Results arrive through `InputController::on_lookup_result`.
    fn match_partial(&mut self, id: RequestId, kind: AutocompleteKind, partial: &str);
}

/// Rendering surface. The core owns no rendering logic.
pub trait Presenter {
    /// Shows lines of output.
    fn display(&mut self, lines: &[String], style: StyleHint);
    /// Replaces the text of the input field.
    fn replace_input(&mut self, text: &str);
    /// Empties the input field.
    fn clear_input(&mut self);
    /// Shows which mode or command the terminal is in.
    fn set_mode_indicator(&mut self, text: &str);
    /// Empties the output area.
    fn clear_display(&mut self);
}

/// Minimal audio primitive driven by the Morse scheduler.
pub trait AudioOutput {
    /// Sets the output gain.
    fn set_gain(&mut self, value: f32);
}

/// State persisted outside the terminal's lifetime.
pub trait Storage {
    /// The stored history, oldest first.
    fn history(&self) -> Vec<String>;
    /// Appends a submitted line to the stored history.
    fn append_history(&mut self, line: &str) -> Result<()>;
    /// Privilege level of the current user.
    fn access_level(&self) -> u32;
    /// Current input mode (for example `cmd` or `chat`).
    fn mode(&self) -> String;
}

/// Executes commands. How a command behaves is entirely up to the handler.
pub trait CommandHandler {
    /// Runs a single-step command. The dispatcher does not wait for it to finish.
    fn execute(&mut self, command: &str, arguments: &[String]) -> Result<()>;

    /// Runs `step` of a multi-step command. A `Reply::Pending` answer is delivered
    /// later through `InputController::on_step_result` under `id`.
    fn step(
        &mut self,
        id: RequestId,
        command: &str,
        arguments: &[String],
        step: usize,
    ) -> Result<Reply<StepOutcome>>;
}

/// Every collaborator the controller needs, bundled for injection.
pub struct Collaborators {
    /// Authorization checks.
    pub authorizer: Box<dyn Authorizer>,
    /// Remote completion lookups.
    pub lookup: Box<dyn RemoteLookup>,
    /// Output surface.
    pub presenter: Box<dyn Presenter>,
    /// Audio gain control.
    pub audio: Box<dyn AudioOutput>,
    /// Persisted state.
    pub storage: Box<dyn Storage>,
    /// Command execution.
    pub handler: Box<dyn CommandHandler>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
