// src/constants.rs

/// Fixed delay between two dispatched commands, identical for every command.
pub const DISPATCH_DELAY_MS: u64 = 400;

/// Length of an audible Morse dot.
pub const MORSE_DOT_MS: u64 = 50;

/// Length of an audible Morse dash.
pub const MORSE_DASH_MS: u64 = 150;

/// Silent gap produced by the `#` separator.
pub const MORSE_SEPARATOR_MS: u64 = 200;

/// Silent gap produced by any other character.
pub const MORSE_GAP_MS: u64 = 75;

/// Gain applied while a pulse is audible.
pub const MORSE_PULSE_GAIN: f32 = 1.0;

/// The word/letter separator symbol of a Morse string.
pub const MORSE_SEPARATOR: char = '#';

/// Input tokens that abort an active multi-step command.
pub const ABORT_TOKENS: &[&str] = &["exit", "abort"];

/// Mode reported by storage when free text should go to the default command.
pub const CHAT_MODE: &str = "chat";

/// Maximum number of history entries kept by the file-backed storage.
pub const HISTORY_LIMIT: usize = 200;

/// The name of the terminal's configuration directory (under the system config dir).
pub const CONFIG_DIR_NAME: &str = "termline";

/// The name of the persisted history file.
pub const HISTORY_FILENAME: &str = "history.bin";
