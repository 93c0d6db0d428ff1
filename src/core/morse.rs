// src/core/morse.rs

//! Morse encoding and pulse-train scheduling.
//!
//! A symbol string is walked left to right with a running time cursor. Dots and
//! dashes schedule a gain-on/gain-off pair, the separator and every other
//! character only advance the cursor. Playbacks requested while another one is
//! still queued continue from its tail, so they concatenate instead of overlapping.

use crate::constants::{
    MORSE_DASH_MS, MORSE_DOT_MS, MORSE_GAP_MS, MORSE_PULSE_GAIN, MORSE_SEPARATOR,
    MORSE_SEPARATOR_MS,
};
use crate::core::scheduler::{Millis, Scheduler, TimerEvent};

/// How a single symbol is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Audible pulse of the given length.
    Pulse(Millis),
    /// Silence of the given length.
    Gap(Millis),
}

impl Symbol {
    /// Classifies a character of a symbol string.
    pub fn classify(c: char) -> Self {
        match c {
            '.' => Self::Pulse(MORSE_DOT_MS),
            '-' => Self::Pulse(MORSE_DASH_MS),
            MORSE_SEPARATOR => Self::Gap(MORSE_SEPARATOR_MS),
            _ => Self::Gap(MORSE_GAP_MS),
        }
    }

    /// Time the symbol occupies on the timeline.
    pub fn duration(self) -> Millis {
        match self {
            Self::Pulse(d) | Self::Gap(d) => d,
        }
    }
}

/// The events scheduled by one playback, relative to the time it was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct MorseTimeline {
    /// Absolute time at which the playback was requested.
    pub origin: Millis,
    /// `(offset, gain)` pairs in scheduling order.
    pub gains: Vec<(Millis, f32)>,
    /// Offset of the terminal cleanup event.
    pub cleanup_at: Millis,
}

/// Owns the tail of the Morse schedule.
#[derive(Debug, Default)]
pub struct MorsePlayer {
    // Absolute time at which the last queued playback ends.
    tail: Option<Millis>,
}

impl MorsePlayer {
    /// Creates a player with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a playback is still queued.
    pub fn is_playing(&self) -> bool {
        self.tail.is_some()
    }

    /// Schedules `symbols` on `scheduler`.
    ///
    /// Unless `silent`, the cleanup event carries the decoded text for display.
    pub fn play(&mut self, symbols: &str, silent: bool, scheduler: &mut Scheduler) -> MorseTimeline {
        let origin = scheduler.now();
        let mut cursor = match self.tail {
            Some(tail) if tail > origin => tail - origin,
            _ => 0,
        };

        let mut gains = Vec::new();
        for symbol in symbols.chars().map(Symbol::classify) {
            let duration = symbol.duration();
            if let Symbol::Pulse(_) = symbol {
                gains.push((cursor, MORSE_PULSE_GAIN));
                gains.push((cursor + duration, 0.0));
            }
            cursor += duration;
        }

        for &(offset, gain) in &gains {
            scheduler.schedule_at(origin + offset, TimerEvent::Gain(gain));
        }
        let text = (!silent).then(|| decode_symbols(symbols));
        scheduler.schedule_at(origin + cursor, TimerEvent::MorseCleanup { text });
        self.tail = Some(origin + cursor);

        log::debug!(
            "Scheduled Morse playback of {} symbols ({} gain events), ends at {}ms",
            symbols.chars().count(),
            gains.len(),
            origin + cursor
        );

        MorseTimeline {
            origin,
            gains,
            cleanup_at: cursor,
        }
    }

    /// Handles a cleanup event fired at `now`. The schedule is released once the
    /// last queued playback has ended.
    pub fn on_cleanup(&mut self, now: Millis) {
        if self.tail.is_some_and(|tail| tail <= now) {
            log::trace!("Morse schedule exhausted at {}ms", now);
            self.tail = None;
        }
    }

    /// Forgets the queued schedule. Used by the global reset.
    pub fn reset(&mut self) {
        self.tail = None;
    }
}

/// The plain form of a symbol string: separators stripped.
pub fn decode_symbols(symbols: &str) -> String {
    symbols.chars().filter(|&c| c != MORSE_SEPARATOR).collect()
}

/// International Morse code for a single character, case-insensitive.
fn code_for(c: char) -> Option<&'static str> {
    let code = match c.to_ascii_lowercase() {
        'a' => ".-",
        'b' => "-...",
        'c' => "-.-.",
        'd' => "-..",
        'e' => ".",
        'f' => "..-.",
        'g' => "--.",
        'h' => "....",
        'i' => "..",
        'j' => ".---",
        'k' => "-.-",
        'l' => ".-..",
        'm' => "--",
        'n' => "-.",
        'o' => "---",
        'p' => ".--.",
        'q' => "--.-",
        'r' => ".-.",
        's' => "...",
        't' => "-",
        'u' => "..-",
        'v' => "...-",
        'w' => ".--",
        'x' => "-..-",
        'y' => "-.--",
        'z' => "--..",
        '0' => "-----",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        '.' => ".-.-.-",
        ',' => "--..--",
        '?' => "..--..",
        '!' => "-.-.--",
        '/' => "-..-.",
        '=' => "-...-",
        '+' => ".-.-.",
        '-' => "-....-",
        '@' => ".--.-.",
        _ => return None,
    };
    Some(code)
}

/// Encodes text as a symbol string: letters separated by a space, words by `#`.
///
/// Characters without a Morse code are skipped.
pub fn encode_text(text: &str) -> String {
    let separator = MORSE_SEPARATOR.to_string();
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter_map(code_for)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(separator.as_str())
}
