//! # System Interaction Layer
//!
//! Everything the terminal core talks to but does not own.
//!
//! ## Modules
//!
//! - **`collaborators`**: The contracts (authorization, remote lookup, presenter,
//!   audio, storage, command handler) injected into the controller.
//! - **`console`**: A stdout presenter, a terminal-bell audio output and the
//!   translation of stdin lines into key events.
//! - **`storage`**: The bincode history file and the session's access level and mode.
//! - **`services`**: Local stand-ins for the remote services: an authorization
//!   policy, a name directory and the command handler behind the built-in registry.

pub mod collaborators;
pub mod console;
pub mod services;
pub mod storage;
