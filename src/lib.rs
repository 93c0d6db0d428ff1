//! An embeddable, line-oriented command terminal core.
//!
//! [`core::controller::InputController`] turns key events and submitted lines
//! into queued command invocations, runs multi-step commands one step at a
//! time, completes commands and options, browses history and schedules Morse
//! playback on a virtual clock. Everything outside the core is reached through
//! the traits in [`system::collaborators`].

include!(concat!(env!("OUT_DIR"), "/messages.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
