// src/system/services.rs

//! Stand-alone collaborators used by the `termline` binary.
//!
//! They replace the network services a real host would talk to: a local
//! authorization policy, a static name directory answering lookups
//! asynchronously, and a small command handler with a couple of wizards.
//! Anything the handler needs from the controller itself (playing Morse,
//! resetting, quitting) is posted to a [`HostQueue`] the host drains.

use crate::core::morse;
use crate::core::pending::{Reply, RequestId};
use crate::core::session::StepOutcome;
use crate::models::{AutocompleteKind, StyleHint};
use crate::system::collaborators::{AuthDecision, Authorizer, CommandHandler, Presenter, RemoteLookup};
use anyhow::{Result, anyhow};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// Work the host must perform on the controller on behalf of a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    /// Play a Morse symbol string.
    PlayMorse(String),
    /// Deliver the answer to a remote lookup.
    LookupReply {
        /// Request being answered.
        id: RequestId,
        /// Matching names.
        names: Vec<String>,
    },
    /// Clear all volatile terminal state.
    Reset,
    /// Leave the interactive loop.
    Quit,
}

/// Queue of [`HostRequest`]s shared between collaborators and the host loop.
pub type HostQueue = Rc<RefCell<VecDeque<HostRequest>>>;

/// Creates an empty host queue.
pub fn host_queue() -> HostQueue {
    Rc::new(RefCell::new(VecDeque::new()))
}

// --- Authorization ---

/// Denies a fixed set of commands, allows everything else.
#[derive(Debug, Default)]
pub struct LocalAuthorizer {
    denied: HashSet<String>,
}

impl LocalAuthorizer {
    /// Creates an authorizer denying the commands in `denied`.
    pub fn new<I, S>(denied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denied: denied.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for LocalAuthorizer {
    fn check_allowed(&mut self, _id: RequestId, command: &str) -> Reply<AuthDecision> {
        if self.denied.contains(command) {
            log::debug!("Authorization of '{}' denied by local policy", command);
            Reply::Ready(AuthDecision::deny())
        } else {
            Reply::Ready(AuthDecision::allow())
        }
    }
}

// --- Remote lookup ---

/// Name directory answering lookups through the host queue, as a remote
/// service would.
#[derive(Debug)]
pub struct StaticLookup {
    users: Vec<String>,
    rooms: Vec<String>,
    my_rooms: Vec<String>,
    host: HostQueue,
}

impl StaticLookup {
    /// Creates a directory over the given user and room names.
    pub fn new(users: Vec<String>, rooms: Vec<String>, my_rooms: Vec<String>, host: HostQueue) -> Self {
        Self {
            users,
            rooms,
            my_rooms,
            host,
        }
    }

    /// A small built-in directory.
    pub fn demo(host: HostQueue) -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self::new(
            names(&["alice", "albert", "bob", "carol", "caroline"]),
            names(&["lobby", "lounge", "radio", "rust"]),
            names(&["lobby", "radio"]),
            host,
        )
    }
}

impl RemoteLookup for StaticLookup {
    fn match_partial(&mut self, id: RequestId, kind: AutocompleteKind, partial: &str) {
        let source = match kind {
            AutocompleteKind::Users => &self.users,
            AutocompleteKind::Rooms => &self.rooms,
            AutocompleteKind::MyRooms => &self.my_rooms,
            AutocompleteKind::None => return,
        };
        let names = source
            .iter()
            .filter(|name| name.starts_with(partial))
            .cloned()
            .collect();
        self.host
            .borrow_mut()
            .push_back(HostRequest::LookupReply { id, names });
    }
}

// --- Command handler ---

#[derive(Debug, Default)]
struct Draft {
    name: String,
    password: String,
}

/// Command handler backing the built-in registry.
pub struct DemoHandler {
    output: Box<dyn Presenter>,
    host: HostQueue,
    commands: Vec<String>,
    accounts: HashMap<String, String>,
    draft: Draft,
}

impl std::fmt::Debug for DemoHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoHandler")
            .field("commands", &self.commands)
            .field("accounts", &self.accounts.len())
            .finish_non_exhaustive()
    }
}

impl DemoHandler {
    /// Creates a handler writing to `output`. `commands` is listed by `help`.
    pub fn new(output: Box<dyn Presenter>, host: HostQueue, commands: Vec<String>) -> Self {
        Self {
            output,
            host,
            commands,
            accounts: HashMap::new(),
            draft: Draft::default(),
        }
    }

    fn say(&mut self, line: String) {
        self.output.display(&[line], StyleHint::Plain);
    }

    fn post(&self, request: HostRequest) {
        self.host.borrow_mut().push_back(request);
    }

    fn register_step(&mut self, input: &str, step: usize) -> Result<StepOutcome> {
        let outcome = match step {
            0 => {
                self.draft = Draft::default();
                self.say(t!("demo.register.ask_name").to_string());
                StepOutcome::Advance { hide_input: false }
            }
            1 => {
                if input.is_empty() || self.accounts.contains_key(input) {
                    self.say(t!("demo.register.ask_name").to_string());
                    return Ok(StepOutcome::Fail {
                        terminal: false,
                        reason: format!(t!("demo.register.name_taken"), name = input),
                    });
                }
                self.draft.name = input.to_string();
                self.say(t!("demo.register.ask_password").to_string());
                StepOutcome::Advance { hide_input: true }
            }
            2 => {
                self.draft.password = input.to_string();
                self.say(t!("demo.register.ask_confirm").to_string());
                StepOutcome::Advance { hide_input: true }
            }
            3 => {
                let draft = std::mem::take(&mut self.draft);
                if draft.password != input {
                    return Ok(StepOutcome::Fail {
                        terminal: true,
                        reason: t!("demo.register.mismatch").to_string(),
                    });
                }
                self.say(format!(t!("demo.register.done"), name = draft.name));
                self.accounts.insert(draft.name, draft.password);
                StepOutcome::Finish
            }
            other => return Err(anyhow!("register has no step {}", other)),
        };
        Ok(outcome)
    }

    fn login_step(&mut self, input: &str, step: usize) -> Result<StepOutcome> {
        let outcome = match step {
            0 => {
                self.draft = Draft::default();
                self.say(t!("demo.login.ask_name").to_string());
                StepOutcome::Advance { hide_input: false }
            }
            1 => {
                self.draft.name = input.to_string();
                self.say(t!("demo.login.ask_password").to_string());
                StepOutcome::Advance { hide_input: true }
            }
            2 => {
                let draft = std::mem::take(&mut self.draft);
                if self.accounts.get(&draft.name).map(String::as_str) != Some(input) {
                    return Ok(StepOutcome::Fail {
                        terminal: true,
                        reason: t!("demo.login.rejected").to_string(),
                    });
                }
                self.say(format!(t!("demo.login.done"), name = draft.name));
                StepOutcome::Finish
            }
            other => return Err(anyhow!("login has no step {}", other)),
        };
        Ok(outcome)
    }
}

impl CommandHandler for DemoHandler {
    fn execute(&mut self, command: &str, arguments: &[String]) -> Result<()> {
        log::debug!("Executing '{}' {:?}", command, arguments);
        match command {
            "help" => {
                let mut lines = vec![t!("demo.help_header").to_string()];
                lines.extend(self.commands.iter().map(|name| format!("  {}", name)));
                self.output.display(&lines, StyleHint::Plain);
            }
            "msg" => self.say(format!(t!("demo.sent"), text = arguments.join(" "))),
            "whisper" => match arguments.split_first() {
                Some((target, rest)) if !rest.is_empty() => {
                    let line = format!(t!("demo.whisper"), target = target, text = rest.join(" "));
                    self.say(line);
                }
                _ => self.say(t!("demo.whisper_usage").to_string()),
            },
            "follow" | "join" => {
                let target = arguments.join(" ");
                self.say(format!(t!("demo.following"), target = target));
            }
            "rooms" => {
                self.say(format!(t!("demo.rooms"), rooms = "lobby, lounge, radio, rust"));
            }
            "settings" => {
                self.say(format!(t!("demo.setting"), path = arguments.join(".")));
            }
            "morse" => {
                let symbols = morse::encode_text(&arguments.join(" "));
                if symbols.is_empty() {
                    self.say(t!("demo.morse.usage").to_string());
                } else {
                    self.post(HostRequest::PlayMorse(symbols));
                }
            }
            "clear" | "ban" => {}
            "logout" => self.post(HostRequest::Reset),
            "quit" => self.post(HostRequest::Quit),
            other => return Err(anyhow!("no handler for '{}'", other)),
        }
        Ok(())
    }

    fn step(
        &mut self,
        _id: RequestId,
        command: &str,
        arguments: &[String],
        step: usize,
    ) -> Result<Reply<StepOutcome>> {
        let input = arguments.join(" ");
        let outcome = match command {
            "register" => self.register_step(&input, step)?,
            "login" => self.login_step(&input, step)?,
            other => return Err(anyhow!("'{}' is not a multi-step command", other)),
        };
        Ok(Reply::Ready(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone)]
    struct Transcript(Rc<RefCell<Vec<String>>>);

    impl Presenter for Transcript {
        fn display(&mut self, lines: &[String], _style: StyleHint) {
            self.0.borrow_mut().extend_from_slice(lines);
        }
        fn replace_input(&mut self, _text: &str) {}
        fn clear_input(&mut self) {}
        fn set_mode_indicator(&mut self, _text: &str) {}
        fn clear_display(&mut self) {}
    }

    fn handler() -> (DemoHandler, Transcript, HostQueue) {
        let transcript = Transcript::default();
        let host = host_queue();
        let handler = DemoHandler::new(
            Box::new(transcript.clone()),
            host.clone(),
            vec!["help".to_string(), "msg".to_string()],
        );
        (handler, transcript, host)
    }

    fn step(handler: &mut DemoHandler, command: &str, input: &str, step: usize) -> StepOutcome {
        let arguments = if input.is_empty() {
            vec![]
        } else {
            vec![input.to_string()]
        };
        match handler.step(RequestId::new(), command, &arguments, step).unwrap() {
            Reply::Ready(outcome) => outcome,
            Reply::Pending => unreachable!("the demo handler always answers immediately"),
        }
    }

    #[test]
    fn test_register_then_login() {
        let (mut handler, transcript, _host) = handler();
        assert_eq!(
            step(&mut handler, "register", "", 0),
            StepOutcome::Advance { hide_input: false }
        );
        assert_eq!(
            step(&mut handler, "register", "alice", 1),
            StepOutcome::Advance { hide_input: true }
        );
        step(&mut handler, "register", "s3cret", 2);
        assert_eq!(step(&mut handler, "register", "s3cret", 3), StepOutcome::Finish);
        assert!(transcript.0.borrow().iter().any(|l| l.contains("alice")));

        step(&mut handler, "login", "", 0);
        step(&mut handler, "login", "alice", 1);
        assert_eq!(step(&mut handler, "login", "s3cret", 2), StepOutcome::Finish);
    }

    #[test]
    fn test_taken_name_is_a_recoverable_failure() {
        let (mut handler, _transcript, _host) = handler();
        for (input, n) in [("", 0), ("bob", 1), ("pw", 2), ("pw", 3)] {
            step(&mut handler, "register", input, n);
        }
        step(&mut handler, "register", "", 0);
        assert!(matches!(
            step(&mut handler, "register", "bob", 1),
            StepOutcome::Fail { terminal: false, .. }
        ));
    }

    #[test]
    fn test_password_mismatch_ends_the_wizard() {
        let (mut handler, _transcript, _host) = handler();
        step(&mut handler, "register", "", 0);
        step(&mut handler, "register", "carol", 1);
        step(&mut handler, "register", "one", 2);
        assert!(matches!(
            step(&mut handler, "register", "two", 3),
            StepOutcome::Fail { terminal: true, .. }
        ));
    }

    #[test]
    fn test_morse_command_posts_playback() {
        let (mut handler, _transcript, host) = handler();
        handler.execute("morse", &["sos".to_string()]).unwrap();
        assert_eq!(
            host.borrow_mut().pop_front(),
            Some(HostRequest::PlayMorse("... --- ...".to_string()))
        );
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        let (mut handler, _transcript, _host) = handler();
        assert!(handler.execute("teleport", &[]).is_err());
        assert!(handler.step(RequestId::new(), "msg", &[], 0).is_err());
    }

    #[test]
    fn test_lookup_answers_through_host_queue() {
        let host = host_queue();
        let mut lookup = StaticLookup::demo(host.clone());
        let id = RequestId::new();
        lookup.match_partial(id, AutocompleteKind::Users, "al");
        assert_eq!(
            host.borrow_mut().pop_front(),
            Some(HostRequest::LookupReply {
                id,
                names: vec!["alice".to_string(), "albert".to_string()],
            })
        );
    }

    #[test]
    fn test_local_authorizer_denies_listed_commands() {
        let mut authorizer = LocalAuthorizer::new(["ban"]);
        assert_eq!(
            authorizer.check_allowed(RequestId::new(), "ban"),
            Reply::Ready(AuthDecision::deny())
        );
        assert_eq!(
            authorizer.check_allowed(RequestId::new(), "msg"),
            Reply::Ready(AuthDecision::allow())
        );
    }
}
