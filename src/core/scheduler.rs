// src/core/scheduler.rs

//! A logical timer queue driven by virtual time.
//!
//! Nothing here sleeps. Events are stored with their due time and handed back
//! in order when the owner advances the clock, so tests can move time forward
//! deterministically and the host can map wall-clock time onto it.

use std::collections::BTreeMap;

/// Milliseconds on the scheduler's timeline.
pub type Millis = u64;

/// Everything the terminal core ever waits for.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// The dispatcher's settle delay elapsed.
    DispatchNext,
    /// Set the audio gain of the Morse output.
    Gain(f32),
    /// End of a Morse playback.
    MorseCleanup {
        /// Decoded text to display, `None` for silent playback.
        text: Option<String>,
    },
}

impl TimerEvent {
    /// Returns `true` for events belonging to a Morse playback.
    pub fn is_morse(&self) -> bool {
        matches!(self, Self::Gain(_) | Self::MorseCleanup { .. })
    }
}

/// The virtual clock and its pending events.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Millis,
    sequence: u64,
    // Sequence breaks ties so equal due times fire in scheduling order.
    events: BTreeMap<(Millis, u64), TimerEvent>,
}

impl Scheduler {
    /// Creates an empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Schedules `event` at the absolute time `at`. Times in the past fire on the next advance.
    pub fn schedule_at(&mut self, at: Millis, event: TimerEvent) {
        log::trace!("Scheduling {:?} at {}ms", event, at);
        self.events.insert((at, self.sequence), event);
        self.sequence += 1;
    }

    /// Schedules `event` `delay` milliseconds from now.
    pub fn schedule_in(&mut self, delay: Millis, event: TimerEvent) {
        self.schedule_at(self.now.saturating_add(delay), event);
    }

    /// Removes and returns the earliest event due at or before `until`, moving the
    /// clock to its due time. Returns `None` once nothing else is due.
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, TimerEvent)> {
        let (&(at, seq), _) = self.events.first_key_value()?;
        if at > until {
            return None;
        }
        let event = self.events.remove(&(at, seq))?;
        self.now = self.now.max(at);
        Some((at, event))
    }

    /// Moves the clock forward without firing anything. Never moves it backwards.
    pub fn set_now(&mut self, now: Millis) {
        self.now = self.now.max(now);
    }

    /// Drops every pending event matching `predicate`. Returns how many were dropped.
    pub fn clear_matching<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&TimerEvent) -> bool,
    {
        let before = self.events.len();
        self.events.retain(|_, event| !predicate(&*event));
        before - self.events.len()
    }

    /// Due time of the earliest pending event.
    pub fn next_due(&self) -> Option<Millis> {
        self.events.keys().next().map(|&(at, _)| at)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_pop_in_due_order_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(50, TimerEvent::Gain(0.0));
        scheduler.schedule_at(0, TimerEvent::Gain(1.0));
        scheduler.schedule_at(50, TimerEvent::DispatchNext);

        assert_eq!(scheduler.pop_due(100), Some((0, TimerEvent::Gain(1.0))));
        assert_eq!(scheduler.pop_due(100), Some((50, TimerEvent::Gain(0.0))));
        assert_eq!(scheduler.pop_due(100), Some((50, TimerEvent::DispatchNext)));
        assert_eq!(scheduler.pop_due(100), None);
        assert_eq!(scheduler.now(), 50);
    }

    #[test]
    fn test_pop_due_respects_the_horizon() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(400, TimerEvent::DispatchNext);
        assert_eq!(scheduler.pop_due(399), None);
        assert_eq!(scheduler.next_due(), Some(400));
        assert!(scheduler.pop_due(400).is_some());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_clear_matching_only_drops_selected_events() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(10, TimerEvent::Gain(1.0));
        scheduler.schedule_at(20, TimerEvent::MorseCleanup { text: None });
        scheduler.schedule_at(30, TimerEvent::DispatchNext);

        assert_eq!(scheduler.clear_matching(TimerEvent::is_morse), 2);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(30));
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut scheduler = Scheduler::new();
        scheduler.set_now(100);
        scheduler.set_now(40);
        assert_eq!(scheduler.now(), 100);
    }
}
