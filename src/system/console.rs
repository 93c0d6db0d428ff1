// src/system/console.rs

//! Line-oriented console host: output rendering, a terminal-bell "speaker" and
//! the translation of cooked stdin lines into key events.

use crate::models::{Key, KeyEvent, StyleHint};
use crate::system::collaborators::{AudioOutput, Presenter};
use colored::*;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

#[derive(Debug, Default)]
struct ConsoleState {
    mode: String,
    input: String,
}

/// Renders terminal output on stdout with `colored`.
///
/// Clones share the same state so the host can keep a handle for drawing the
/// prompt while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ConsolePresenter {
    state: Rc<RefCell<ConsoleState>>,
}

impl ConsolePresenter {
    /// Creates a presenter with an empty prompt.
    pub fn new() -> Self {
        Self::default()
    }

    /// The prompt line: mode indicator followed by the current input.
    pub fn prompt(&self) -> String {
        let state = self.state.borrow();
        format!(
            "{}{}",
            format!(t!("console.prompt"), mode = state.mode).bold(),
            state.input
        )
    }

    /// Prints the prompt without a line break.
    pub fn draw_prompt(&self) {
        print!("{}", self.prompt());
        // A failed flush only delays the prompt.
        let _ = std::io::stdout().flush();
    }
}

/// Formats `lines` for the console according to `style`.
pub fn render(lines: &[String], style: StyleHint) -> Vec<String> {
    match style {
        StyleHint::Candidates => vec![lines.join("  ").cyan().to_string()],
        StyleHint::Echo => lines
            .iter()
            .map(|l| format!("{} {}", ">".dimmed(), l.dimmed()))
            .collect(),
        StyleHint::Notice => lines.iter().map(|l| l.yellow().to_string()).collect(),
        StyleHint::Failure => lines.iter().map(|l| l.red().to_string()).collect(),
        StyleHint::Morse => lines.iter().map(|l| l.magenta().bold().to_string()).collect(),
        StyleHint::Plain => lines.to_vec(),
    }
}

impl Presenter for ConsolePresenter {
    fn display(&mut self, lines: &[String], style: StyleHint) {
        for line in render(lines, style) {
            println!("{}", line);
        }
    }

    fn replace_input(&mut self, text: &str) {
        self.state.borrow_mut().input = text.to_string();
    }

    fn clear_input(&mut self) {
        self.state.borrow_mut().input.clear();
    }

    fn set_mode_indicator(&mut self, text: &str) {
        self.state.borrow_mut().mode = text.to_string();
    }

    fn clear_display(&mut self) {
        // ANSI: clear screen, cursor home.
        print!("\x1b[2J\x1b[H");
        let _ = std::io::stdout().flush();
    }
}

/// Audio stand-in: rings the terminal bell on each rising edge.
#[derive(Debug, Default)]
pub struct ConsoleAudio {
    bell: bool,
    gain: f32,
}

impl ConsoleAudio {
    /// Creates the output. With `bell` off, gain changes are only logged.
    pub fn new(bell: bool) -> Self {
        Self { bell, gain: 0.0 }
    }
}

impl AudioOutput for ConsoleAudio {
    fn set_gain(&mut self, value: f32) {
        log::trace!("Gain {} -> {}", self.gain, value);
        if self.bell && value > 0.0 && self.gain <= 0.0 {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
        self.gain = value;
    }
}

/// Translates one cooked stdin line into key events.
///
/// Printable characters map to themselves, a space to [`Key::Space`], a tab to
/// [`Key::Tab`] and the ANSI arrow sequences to [`Key::Up`]/[`Key::Down`]; a lone
/// ESC is [`Key::Escape`]. The line is submitted with [`Key::Enter`] unless its
/// last key was a tab, an arrow or ESC, so completions and history entries
/// can be edited on the next line.
pub fn line_to_keys(line: &str) -> Vec<KeyEvent> {
    let mut keys = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        let key = match c {
            '\x1b' if chars.peek() == Some(&'[') => {
                chars.next();
                match chars.next() {
                    Some('A') => Key::Up,
                    Some('B') => Key::Down,
                    _ => continue,
                }
            }
            '\x1b' => Key::Escape,
            '\t' => Key::Tab,
            ' ' => Key::Space,
            '\x7f' | '\x08' => Key::Backspace,
            c if c.is_control() => continue,
            c => Key::Char(c),
        };
        keys.push(key);
    }

    let submit = !matches!(
        keys.last(),
        Some(Key::Tab | Key::Up | Key::Down | Key::Escape)
    );
    if submit {
        keys.push(Key::Enter);
    }
    keys.into_iter().map(KeyEvent::press).collect()
}
