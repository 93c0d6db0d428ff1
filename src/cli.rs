// src/cli.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

/// termline: an interactive command terminal.
///
/// Lines typed on stdin are resolved against a command registry and run one at
/// a time. A line ending in a tab asks for completion instead of being
/// submitted; the arrow keys browse history. Some commands (`register`,
/// `login`) are wizards that take their answers on the following lines; type
/// `exit` or `abort` to leave one.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command registry to load instead of the built-in one.
    ///
    /// Supports `~` and environment variables (e.g., `$HOME/commands.toml`).
    #[arg(long, value_name = "FILE")]
    pub registry: Option<String>,

    /// History file. Defaults to `<config dir>/termline/history.bin`.
    #[arg(long, value_name = "FILE")]
    pub history_file: Option<String>,

    /// Privilege level of the session.
    #[arg(long, default_value_t = 0)]
    pub access_level: u32,

    /// Input mode. In `chat` mode, lines that are not commands are sent as messages.
    #[arg(long, default_value = "cmd")]
    pub mode: String,

    /// Keep history in memory only.
    #[arg(long)]
    pub no_history: bool,

    /// Ring the terminal bell for Morse pulses.
    #[arg(long)]
    pub bell: bool,
}

impl Cli {
    /// The expanded `--registry` path, if one was given.
    pub fn registry_path(&self) -> Result<Option<PathBuf>> {
        self.registry.as_deref().map(expand_path).transpose()
    }

    /// The expanded `--history-file` path, if one was given.
    pub fn history_path(&self) -> Result<Option<PathBuf>> {
        self.history_file.as_deref().map(expand_path).transpose()
    }
}

/// Expands `~` and environment variables (`$VAR`) in a user-supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(template)
        .map_err(|e| anyhow!("Failed to expand path '{}': {}", template, e))?;
    Ok(PathBuf::from(expanded.into_owned()))
}
