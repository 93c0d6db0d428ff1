// src/core/controller.rs

//! # Input Controller
//!
//! Orchestrates the terminal core. It receives key events and submitted lines,
//! resolves them against the registry, feeds the dispatcher and the multi-step
//! session machine, drives autocompletion and history, and fires timer events
//! when the host advances the virtual clock.
//!
//! All state is owned here and injected at construction; nothing is global, so
//! several controllers can coexist (one per test, for instance).

use crate::constants::{ABORT_TOKENS, CHAT_MODE};
use crate::core::autocomplete::{self, Completion};
use crate::core::dispatcher::Dispatcher;
use crate::core::errors::TerminalError;
use crate::core::history::HistoryNavigator;
use crate::core::morse::{MorsePlayer, MorseTimeline};
use crate::core::pending::{self, PendingRequest, PendingTable, Reply, RequestId};
use crate::core::registry::CommandRegistry;
use crate::core::scheduler::{Millis, Scheduler, TimerEvent};
use crate::core::session::{SessionMachine, StepOutcome, Transition};
use crate::models::{
    AutocompleteKind, CommandDefinition, Key, KeyAction, KeyEvent, ModifierState,
    QueuedInvocation, StyleHint,
};
use crate::system::collaborators::{AuthDecision, Collaborators};

/// What became of a submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The line was blank.
    Empty,
    /// An invocation of the named command was queued.
    Queued(String),
    /// Resolution waits for the authorization collaborator.
    AwaitingAuthorization(RequestId),
    /// The active multi-step command was aborted.
    Aborted,
}

/// How a key event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The character should be inserted into the visible input.
    Insert(char),
    /// The event was consumed by the controller.
    Handled,
    /// The event must not reach the visible input.
    Suppressed,
    /// The event had no effect.
    Ignored,
}

/// The terminal core.
#[derive(Debug)]
pub struct InputController {
    registry: CommandRegistry,
    history: HistoryNavigator,
    dispatcher: Dispatcher,
    session: SessionMachine,
    pending: PendingTable,
    morse: MorsePlayer,
    scheduler: Scheduler,
    modifiers: ModifierState,
    buffer: String,
    io: Collaborators,
}

impl InputController {
    /// Builds a controller. History is loaded from the storage collaborator.
    pub fn new(registry: CommandRegistry, io: Collaborators) -> Self {
        let history = HistoryNavigator::new(io.storage.history());
        log::debug!("Terminal started with {} history entries", history.len());
        let mut controller = Self {
            registry,
            history,
            dispatcher: Dispatcher::new(),
            session: SessionMachine::new(),
            pending: PendingTable::new(),
            morse: MorsePlayer::new(),
            scheduler: Scheduler::new(),
            modifiers: ModifierState::default(),
            buffer: String::new(),
            io,
        };
        controller.restore_mode_indicator();
        controller
    }

    // --- Accessors ---

    /// The mirrored input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// The multi-step session machine.
    pub fn session(&self) -> &SessionMachine {
        &self.session
    }

    /// The history navigator.
    pub fn history(&self) -> &HistoryNavigator {
        &self.history
    }

    /// The dispatch queue.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The command registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Current virtual time.
    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    /// Due time of the next timer event, if any.
    pub fn next_due(&self) -> Option<Millis> {
        self.scheduler.next_due()
    }

    /// Returns `true` while a Morse playback is queued.
    pub fn is_playing_morse(&self) -> bool {
        self.morse.is_playing()
    }

    // --- Key handling ---

    /// Handles a raw key event.
    pub fn handle_key(&mut self, event: KeyEvent) -> KeyOutcome {
        if self.modifiers.apply(event) || event.action == KeyAction::Release {
            return KeyOutcome::Ignored;
        }

        let wants_abort =
            event.key == Key::Escape || (self.modifiers.ctrl && event.key == Key::Char('c'));
        if wants_abort {
            if !self.abort_active() {
                self.set_buffer(String::new());
            }
            return KeyOutcome::Handled;
        }

        // Typing stays possible while locked so an abort token can be entered.
        let editing = matches!(
            event.key,
            Key::Char(_) | Key::Space | Key::Backspace | Key::Enter
        );
        if self.session.is_input_locked() && !editing {
            log::trace!("Key {:?} suppressed while input is locked", event.key);
            return KeyOutcome::Suppressed;
        }

        match event.key {
            Key::Char(_) if self.modifiers.ctrl || self.modifiers.alt => KeyOutcome::Ignored,
            Key::Char(c) => {
                self.buffer.push(c);
                KeyOutcome::Insert(c)
            }
            Key::Space => {
                if self.buffer.ends_with(char::is_whitespace) {
                    // Second consecutive space: strip and complete instead of inserting.
                    let trimmed = self.buffer.trim_end().to_string();
                    self.set_buffer(trimmed);
                    self.autocomplete();
                    KeyOutcome::Suppressed
                } else {
                    self.buffer.push(' ');
                    KeyOutcome::Insert(' ')
                }
            }
            Key::Backspace => {
                let mut text = std::mem::take(&mut self.buffer);
                text.pop();
                self.set_buffer(text);
                KeyOutcome::Handled
            }
            Key::Enter => {
                let line = std::mem::take(&mut self.buffer);
                // Failures are displayed by `submit_line` itself.
                if let Err(TerminalError::InputLocked) = self.submit_line(&line) {
                    self.buffer = line;
                }
                KeyOutcome::Handled
            }
            Key::Tab => {
                self.autocomplete();
                KeyOutcome::Handled
            }
            Key::Up => self.browse_history(true),
            Key::Down => self.browse_history(false),
            Key::Escape | Key::Ctrl | Key::Shift | Key::Alt => KeyOutcome::Ignored,
        }
    }

    fn browse_history(&mut self, older: bool) -> KeyOutcome {
        if self.session.is_active() {
            return KeyOutcome::Ignored;
        }
        let line = if older {
            match self.history.move_up() {
                Some(line) => line.to_string(),
                None => return KeyOutcome::Ignored,
            }
        } else {
            self.history.move_down().to_string()
        };
        self.set_buffer(line);
        KeyOutcome::Handled
    }

    fn set_buffer(&mut self, text: String) {
        if text.is_empty() {
            self.io.presenter.clear_input();
        } else {
            self.io.presenter.replace_input(&text);
        }
        self.buffer = text;
    }

    // --- Submission ---

    /// Submits a complete input line.
    pub fn submit_line(&mut self, text: &str) -> Result<Submission, TerminalError> {
        let line = text.trim();
        if self.session.is_active() && is_abort_token(line) {
            self.buffer.clear();
            self.io.presenter.clear_input();
            self.abort_active();
            return Ok(Submission::Aborted);
        }
        if self.session.is_input_locked() || self.pending.has_blocking() {
            return Err(self.report(TerminalError::InputLocked));
        }

        self.buffer.clear();
        self.io.presenter.clear_input();
        self.pending.drop_lookups();

        if line.is_empty() {
            return Ok(Submission::Empty);
        }

        if self.session.is_active() {
            return Ok(self.submit_step_input(line));
        }

        let tokens = tokenize(line);
        let Some((first, arguments)) = tokens.split_first() else {
            return Ok(Submission::Empty);
        };

        match self.registry.find(first).cloned() {
            Some(definition) => {
                if !definition.hide_input {
                    self.remember(line);
                }
                self.resolve(&definition, arguments.to_vec(), line, first)
            }
            None => {
                self.remember(line);
                match self.chat_fallback() {
                    Some(definition) => {
                        self.resolve(&definition, vec![line.to_string()], line, first)
                    }
                    None => Err(self.report(TerminalError::UnknownCommand(first.clone()))),
                }
            }
        }
    }

    fn chat_fallback(&self) -> Option<CommandDefinition> {
        if self.io.storage.mode() != CHAT_MODE {
            return None;
        }
        self.registry.default_command().cloned()
    }

    fn remember(&mut self, line: &str) {
        self.history.push(line);
        if let Err(e) = self.io.storage.append_history(line) {
            log::warn!("Failed to persist history entry: {:#}", e);
        }
    }

    fn submit_step_input(&mut self, line: &str) -> Submission {
        let Some(session) = self.session.active() else {
            return Submission::Empty;
        };
        let command = session.command.clone();
        let echo = if session.hide_input {
            mask(line)
        } else {
            line.to_string()
        };
        self.session.lock_input();
        let invocation = QueuedInvocation::new(command.clone(), tokenize(line)).with_echo(echo);
        self.enqueue_invocation(invocation);
        Submission::Queued(command)
    }

    fn resolve(
        &mut self,
        definition: &CommandDefinition,
        arguments: Vec<String>,
        line: &str,
        typed: &str,
    ) -> Result<Submission, TerminalError> {
        let level = self.io.storage.access_level();
        if !definition.is_visible_to(level) {
            return Err(self.report(TerminalError::UnknownCommand(typed.to_string())));
        }
        if !definition.is_accessible_to(level) {
            return Err(self.report(TerminalError::Unauthorized {
                command: definition.name.clone(),
                subject: None,
            }));
        }

        let echo = if definition.hide_input {
            mask(line)
        } else {
            line.to_string()
        };
        let invocation = QueuedInvocation::new(definition.name.clone(), arguments).with_echo(echo);

        let id = RequestId::new();
        match self.io.authorizer.check_allowed(id, &definition.name) {
            Reply::Ready(decision) => {
                self.finish_resolution(invocation, definition.multi_step, decision)
            }
            Reply::Pending => {
                log::debug!("Authorization of '{}' pending ({})", definition.name, id);
                self.pending.insert(
                    id,
                    PendingRequest::Authorization {
                        invocation,
                        multi_step: definition.multi_step,
                    },
                );
                Ok(Submission::AwaitingAuthorization(id))
            }
        }
    }

    fn finish_resolution(
        &mut self,
        invocation: QueuedInvocation,
        multi_step: bool,
        decision: AuthDecision,
    ) -> Result<Submission, TerminalError> {
        let command = invocation.command_name.clone();
        if !decision.allowed {
            return Err(self.report(TerminalError::Unauthorized {
                command,
                subject: decision.subject,
            }));
        }

        if multi_step {
            let Some(definition) = self.registry.find(&command).cloned() else {
                return Err(self.report(TerminalError::UnknownCommand(command)));
            };
            self.session.start(&definition);
            self.session.lock_input();
            self.io.presenter.set_mode_indicator(&definition.name);
        }
        self.enqueue_invocation(invocation);
        Ok(Submission::Queued(command))
    }

    /// Delivers a pending authorization decision.
    pub fn on_authorization(
        &mut self,
        id: RequestId,
        decision: AuthDecision,
    ) -> Option<Result<Submission, TerminalError>> {
        match self.pending.take(id)? {
            PendingRequest::Authorization {
                invocation,
                multi_step,
            } => Some(self.finish_resolution(invocation, multi_step, decision)),
            other => {
                log::warn!("Request {} is not an authorization: {:?}", id, other);
                self.pending.insert(id, other);
                None
            }
        }
    }

    // --- Dispatch ---

    /// Queues an invocation from outside the input path.
    pub fn enqueue(&mut self, command: &str, arguments: Vec<String>, echo: Option<String>) {
        let mut invocation = QueuedInvocation::new(command, arguments);
        invocation.echo_message = echo;
        self.enqueue_invocation(invocation);
    }

    fn enqueue_invocation(&mut self, invocation: QueuedInvocation) {
        self.dispatcher.enqueue(invocation);
        if let Some(next) = self.dispatcher.start(&mut self.scheduler) {
            self.run_invocation(next);
        }
    }

    fn run_invocation(&mut self, invocation: QueuedInvocation) {
        let definition = self.registry.find(&invocation.command_name).cloned();
        let flags = definition.as_ref();
        let step = self
            .session
            .active()
            .filter(|s| s.command == invocation.command_name)
            .map(|s| s.step);

        // Only the first step of a multi-step command starts on a clean display.
        if flags.is_some_and(|d| d.clear_before_use) && step.unwrap_or(0) == 0 {
            self.io.presenter.clear_display();
        }
        if let Some(echo) = &invocation.echo_message {
            self.io.presenter.display(std::slice::from_ref(echo), StyleHint::Echo);
        }

        match step {
            Some(step) => self.run_step(invocation, step),
            None if flags.is_some_and(|d| d.multi_step) => {
                log::debug!(
                    "Dropping '{}': its session is no longer active",
                    invocation.command_name
                );
            }
            None => {
                let result = self
                    .io
                    .handler
                    .execute(&invocation.command_name, &invocation.arguments);
                match result {
                    Ok(()) => {
                        if flags.is_some_and(|d| d.clear_after_use) {
                            self.io.presenter.clear_display();
                        }
                    }
                    Err(e) => {
                        self.internal_fault(&invocation.command_name, &e);
                    }
                }
            }
        }
    }

    fn run_step(&mut self, invocation: QueuedInvocation, step: usize) {
        let id = RequestId::new();
        let command = invocation.command_name;
        log::debug!("Running step {} of '{}'", step, command);
        match self
            .io
            .handler
            .step(id, &command, &invocation.arguments, step)
        {
            Ok(Reply::Ready(outcome)) => self.apply_step_outcome(&command, outcome),
            Ok(Reply::Pending) => {
                self.pending.insert(id, PendingRequest::Step { command });
            }
            Err(e) => {
                self.internal_fault(&command, &e);
            }
        }
    }

    /// Delivers the outcome of a pending step.
    pub fn on_step_result(&mut self, id: RequestId, outcome: StepOutcome) {
        match self.pending.take(id) {
            Some(PendingRequest::Step { command }) => self.apply_step_outcome(&command, outcome),
            Some(other) => {
                log::warn!("Request {} is not a step: {:?}", id, other);
                self.pending.insert(id, other);
            }
            None => {}
        }
    }

    fn apply_step_outcome(&mut self, command: &str, outcome: StepOutcome) {
        let Some(session) = self
            .session
            .active()
            .filter(|s| s.command == command)
            .cloned()
        else {
            log::debug!("Step outcome for inactive '{}' ignored", command);
            return;
        };

        let transition = self.session.apply(&outcome);
        self.session.unlock_input();

        if let StepOutcome::Fail { reason, .. } = &outcome {
            let failure = TerminalError::StepFailure {
                command: command.to_string(),
                step: session.step,
                reason: reason.clone(),
            };
            self.report(failure);
        }

        if transition == Some(Transition::Ended) {
            log::debug!("Session '{}' completed", command);
            self.restore_mode_indicator();
            if session.clear_after_use {
                self.io.presenter.clear_display();
            }
        }
    }

    // --- Abort and reset ---

    /// Aborts the active multi-step command. Returns `false` (and does nothing)
    /// when no command is active.
    pub fn abort_active(&mut self) -> bool {
        let Some(session) = self.session.abort() else {
            return false;
        };
        let dropped = self.dispatcher.discard_command(&session.command);
        self.pending.drop_steps();
        log::debug!(
            "Aborted '{}' at step {} ({} queued step(s) dropped)",
            session.command,
            session.step,
            dropped
        );
        self.io.presenter.display(
            &[format!(t!("session.aborted"), command = session.command)],
            StyleHint::Notice,
        );
        self.restore_mode_indicator();
        if session.clear_after_use {
            self.io.presenter.clear_display();
        }
        true
    }

    /// Clears all volatile state: session, queue, pending requests, input buffer
    /// and Morse schedule. History and registry are kept.
    pub fn reset(&mut self) {
        log::debug!("Resetting terminal state");
        self.session.reset();
        self.dispatcher.reset();
        if !self.pending.is_empty() {
            log::debug!("Discarding outstanding collaborator requests");
        }
        self.pending.clear();
        self.scheduler.clear_matching(|_| true);
        self.morse.reset();
        self.io.audio.set_gain(0.0);
        self.modifiers = ModifierState::default();
        self.history.reset_pointer();
        self.buffer.clear();
        self.io.presenter.clear_input();
        self.restore_mode_indicator();
    }

    fn internal_fault(&mut self, command: &str, error: &anyhow::Error) -> TerminalError {
        log::error!("Handler for '{}' failed: {:#}", command, error);
        self.reset();
        self.io
            .presenter
            .display(&[t!("fault.notice").to_string()], StyleHint::Notice);
        self.report(TerminalError::InternalFault {
            command: command.to_string(),
            message: format!("{:#}", error),
        })
    }

    fn restore_mode_indicator(&mut self) {
        let mode = self.io.storage.mode();
        self.io.presenter.set_mode_indicator(&mode);
    }

    fn report(&mut self, error: TerminalError) -> TerminalError {
        log::debug!("Reporting: {}", error);
        self.io
            .presenter
            .display(&[error.to_string()], StyleHint::Failure);
        error
    }

    // --- Autocomplete ---

    /// Completes the input buffer. Returns the local outcome; remote lookups
    /// return [`Completion::None`] and apply their result when it arrives.
    pub fn autocomplete(&mut self) -> Completion {
        if self.session.is_active() {
            return Completion::None;
        }
        let buffer = self.buffer.clone();
        let (tokens, partial) = autocomplete::split_partial(&buffer);
        let level = self.io.storage.access_level();

        let completion = match tokens.split_first() {
            None => autocomplete::complete(partial, self.registry.visible_names(level)),
            Some((command, typed)) => {
                let Some(definition) = self
                    .registry
                    .find(command)
                    .filter(|d| d.is_visible_to(level) && d.is_accessible_to(level))
                else {
                    return Completion::None;
                };
                if definition.autocomplete != AutocompleteKind::None && typed.is_empty() {
                    let kind = definition.autocomplete;
                    self.request_lookup(kind, &buffer, partial);
                    return Completion::None;
                }
                autocomplete::complete_option(&definition.options, typed, partial)
            }
        };

        log::debug!("Completion of '{}': {:?}", partial, completion);
        self.apply_completion(&buffer, partial, &completion);
        completion
    }

    fn request_lookup(&mut self, kind: AutocompleteKind, buffer: &str, partial: &str) {
        self.pending.drop_lookups();
        let id = RequestId::new();
        self.pending.insert(
            id,
            PendingRequest::Lookup {
                buffer: buffer.to_string(),
                partial: partial.to_string(),
            },
        );
        log::debug!("Remote lookup {:?} for '{}' ({})", kind, partial, id);
        self.io.lookup.match_partial(id, kind, partial);
    }

    /// Delivers remote lookup candidates. Results for a buffer that changed in the
    /// meantime are discarded.
    pub fn on_lookup_result(&mut self, id: RequestId, names: &[String]) -> Completion {
        let (buffer, partial) = match self.pending.take(id) {
            Some(PendingRequest::Lookup { buffer, partial }) => (buffer, partial),
            Some(other) => {
                log::warn!("Request {} is not a lookup: {:?}", id, other);
                self.pending.insert(id, other);
                return Completion::None;
            }
            None => return Completion::None,
        };
        if buffer != self.buffer {
            log::debug!("Stale lookup result for '{}' discarded", partial);
            return Completion::None;
        }
        let completion = pending::complete_remote(&partial, names);
        self.apply_completion(&buffer, &partial, &completion);
        completion
    }

    fn apply_completion(&mut self, buffer: &str, partial: &str, completion: &Completion) {
        if let Some(replacement) = completion.replacement(partial) {
            let base = buffer.strip_suffix(partial).unwrap_or(buffer);
            self.set_buffer(format!("{}{}", base, replacement));
        }
        let listing = completion.listing();
        if !listing.is_empty() {
            self.io.presenter.display(listing, StyleHint::Candidates);
        }
    }

    // --- Time and audio ---

    /// Plays a Morse symbol string. Unless `silent`, the decoded text is displayed
    /// when the playback ends.
    pub fn play_morse(&mut self, symbols: &str, silent: bool) -> MorseTimeline {
        self.morse.play(symbols, silent, &mut self.scheduler)
    }

    /// Advances the virtual clock to `now`, firing every event due on the way in order.
    pub fn advance_to(&mut self, now: Millis) {
        while let Some((at, event)) = self.scheduler.pop_due(now) {
            self.fire(at, event);
        }
        self.scheduler.set_now(now);
    }

    /// Advances the virtual clock by `delta` milliseconds.
    pub fn advance_by(&mut self, delta: Millis) {
        self.advance_to(self.scheduler.now().saturating_add(delta));
    }

    fn fire(&mut self, at: Millis, event: TimerEvent) {
        log::trace!("Firing {:?} at {}ms", event, at);
        match event {
            TimerEvent::DispatchNext => {
                if let Some(next) = self.dispatcher.on_tick(&mut self.scheduler) {
                    self.run_invocation(next);
                }
            }
            TimerEvent::Gain(value) => self.io.audio.set_gain(value),
            TimerEvent::MorseCleanup { text } => {
                self.morse.on_cleanup(at);
                if let Some(text) = text {
                    self.io.presenter.display(&[text], StyleHint::Morse);
                }
            }
        }
    }
}

/// Splits a line into argument tokens, honoring shell-style quotes. Falls back
/// to whitespace splitting for unbalanced quotes.
pub fn tokenize(line: &str) -> Vec<String> {
    shlex::split(line)
        .unwrap_or_else(|| line.split_whitespace().map(str::to_string).collect())
}

fn is_abort_token(line: &str) -> bool {
    ABORT_TOKENS.iter().any(|token| token.eq_ignore_ascii_case(line))
}

fn mask(line: &str) -> String {
    "*".repeat(line.chars().count())
}
