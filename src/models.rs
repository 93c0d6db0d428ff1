// src/models.rs

//! Data model shared by the terminal core and its collaborators.
//!
//! Registry-side types (`CommandDefinition`, `OptionNode`) are deserialized from
//! TOML; runtime types (`QueuedInvocation`, `KeyEvent`, ...) only live in memory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- REGISTRY MODELS (FOR TOML) ---

/// Selects which remote-lookup strategy completes the first argument of a command.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AutocompleteKind {
    /// No remote lookup. Option-tree completion is used instead.
    #[default]
    None,
    /// Completes against known user names.
    Users,
    /// Completes against every room.
    Rooms,
    /// Completes against the rooms the caller is a member of.
    MyRooms,
}

/// A node of a command's option tree. Each key leads to a nested node of any depth.
///
/// Only used for autocompletion.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct OptionNode {
    /// Child options, ordered by key so completion listings are deterministic.
    pub children: BTreeMap<String, OptionNode>,
}

impl OptionNode {
    /// Descends one level per token. Returns `None` as soon as a token is not a key.
    pub fn descend<'a, I>(&self, path: I) -> Option<&Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut node = self;
        for token in path {
            node = node.children.get(token)?;
        }
        Some(node)
    }

    /// The keys of this node, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Returns `true` if this node has no options below it.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An immutable command definition owned by the registry.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandDefinition {
    /// Unique key of the command.
    pub name: String,
    /// Alternative names that resolve to `name`.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Minimum privilege required to run the command. `None` means unrestricted.
    #[serde(default)]
    pub access_level: Option<u32>,
    /// Minimum privilege required to see the command in listings and completions.
    #[serde(default)]
    pub visibility: Option<u32>,
    /// Nested option keys used for autocompletion of sub-options.
    #[serde(default)]
    pub options: OptionNode,
    /// Remote-lookup strategy for the first argument.
    #[serde(default)]
    pub autocomplete: AutocompleteKind,
    /// Invoking the command starts a multi-step session.
    #[serde(default)]
    pub multi_step: bool,
    /// Clear the display before the command is dispatched.
    #[serde(default)]
    pub clear_before_use: bool,
    /// Clear the display once the command (or its session) completes.
    #[serde(default)]
    pub clear_after_use: bool,
    /// Mask the echo of the input that starts and feeds this command.
    #[serde(default)]
    pub hide_input: bool,
    /// Step resumed after a recoverable step failure.
    #[serde(default)]
    pub fallback_step: usize,
}

impl CommandDefinition {
    /// Checks whether a caller with `level` can see the command.
    pub fn is_visible_to(&self, level: u32) -> bool {
        self.visibility.is_none_or(|min| level >= min)
    }

    /// Checks whether a caller with `level` passes the static access constraint.
    pub fn is_accessible_to(&self, level: u32) -> bool {
        self.access_level.is_none_or(|min| level >= min)
    }
}

/// Top-level shape of a registry TOML file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistryFile {
    /// Command receiving free text when the terminal is in chat mode.
    #[serde(default)]
    pub default_command: Option<String>,
    /// All command definitions.
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandDefinition>,
}

// --- RUNTIME MODELS ---

/// A resolved command waiting in the dispatch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedInvocation {
    /// Canonical command name.
    pub command_name: String,
    /// Ordered argument tokens.
    pub arguments: Vec<String>,
    /// Text displayed once the invocation is dispatched.
    pub echo_message: Option<String>,
}

impl QueuedInvocation {
    /// Creates an invocation with no echo.
    pub fn new(command_name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command_name: command_name.into(),
            arguments,
            echo_message: None,
        }
    }

    /// Attaches an echo message.
    pub fn with_echo(mut self, echo: impl Into<String>) -> Self {
        self.echo_message = Some(echo.into());
        self
    }
}

/// Presentation hints passed along with displayed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleHint {
    /// Plain output.
    #[default]
    Plain,
    /// Echo of the user's own input.
    Echo,
    /// A completion candidate listing.
    Candidates,
    /// Informational notice from the terminal itself.
    Notice,
    /// A failure message.
    Failure,
    /// Decoded text following a Morse playback.
    Morse,
}

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character, space excluded.
    Char(char),
    /// The space bar.
    Space,
    /// Removes the last character of the buffer.
    Backspace,
    /// Submits the buffer.
    Enter,
    /// Requests autocompletion.
    Tab,
    /// Older history entry.
    Up,
    /// Newer history entry.
    Down,
    /// Aborts the active session or clears the buffer.
    Escape,
    /// The control modifier.
    Ctrl,
    /// The shift modifier.
    Shift,
    /// The alt modifier.
    Alt,
}

/// Whether a key went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Key pressed.
    Press,
    /// Key released.
    Release,
}

/// A raw keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key involved.
    pub key: Key,
    /// Press or release.
    pub action: KeyAction,
}

impl KeyEvent {
    /// A key press.
    pub fn press(key: Key) -> Self {
        Self {
            key,
            action: KeyAction::Press,
        }
    }

    /// A key release.
    pub fn release(key: Key) -> Self {
        Self {
            key,
            action: KeyAction::Release,
        }
    }
}

/// Modifier keys currently held. Updated by presses and releases and consulted
/// when interpreting other keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierState {
    /// Control is held.
    pub ctrl: bool,
    /// Shift is held.
    pub shift: bool,
    /// Alt is held.
    pub alt: bool,
}

impl ModifierState {
    /// Applies a modifier event. Returns `true` if the event was a modifier.
    pub fn apply(&mut self, event: KeyEvent) -> bool {
        let held = event.action == KeyAction::Press;
        match event.key {
            Key::Ctrl => self.ctrl = held,
            Key::Shift => self.shift = held,
            Key::Alt => self.alt = held,
            _ => return false,
        }
        true
    }
}
