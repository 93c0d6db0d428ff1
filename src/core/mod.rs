// src/core/mod.rs

pub mod autocomplete;
pub mod controller;
pub mod dispatcher;
pub mod errors;
pub mod history;
pub mod morse;
pub mod pending;
pub mod registry;
pub mod scheduler;
pub mod session;
