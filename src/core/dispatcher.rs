// src/core/dispatcher.rs

use crate::constants::DISPATCH_DELAY_MS;
use crate::core::scheduler::{Scheduler, TimerEvent};
use crate::models::QueuedInvocation;
use std::collections::VecDeque;

/// FIFO of resolved invocations, drained one at a time.
///
/// Each dispatched invocation arms a fixed settle delay on the scheduler; the
/// next invocation is released only when that delay fires. The dispatcher never
/// waits for the handler to report completion.
#[derive(Debug, Default)]
pub struct Dispatcher {
    queue: VecDeque<QueuedInvocation>,
    busy: bool,
}

impl Dispatcher {
    /// Creates an idle dispatcher with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an invocation to the tail of the queue.
    pub fn enqueue(&mut self, invocation: QueuedInvocation) {
        log::debug!(
            "Queued '{}' with {} argument(s), {} waiting",
            invocation.command_name,
            invocation.arguments.len(),
            self.queue.len() + 1
        );
        self.queue.push_back(invocation);
    }

    /// Starts draining. Returns the invocation to run now, or `None` if the
    /// dispatcher is already draining or nothing is queued.
    pub fn start(&mut self, scheduler: &mut Scheduler) -> Option<QueuedInvocation> {
        if self.busy {
            log::trace!("Dispatcher already draining, start ignored");
            return None;
        }
        self.release_next(scheduler)
    }

    /// Handles the settle delay firing. Returns the next invocation to run, if any.
    pub fn on_tick(&mut self, scheduler: &mut Scheduler) -> Option<QueuedInvocation> {
        self.release_next(scheduler)
    }

    fn release_next(&mut self, scheduler: &mut Scheduler) -> Option<QueuedInvocation> {
        match self.queue.pop_front() {
            Some(invocation) => {
                self.busy = true;
                scheduler.schedule_in(DISPATCH_DELAY_MS, TimerEvent::DispatchNext);
                log::debug!("Dispatching '{}'", invocation.command_name);
                Some(invocation)
            }
            None => {
                if self.busy {
                    log::trace!("Dispatch queue drained");
                }
                self.busy = false;
                None
            }
        }
    }

    /// Returns `true` while an invocation's settle delay is running.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Number of invocations waiting.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drops waiting invocations of `command`. Returns how many were dropped.
    pub fn discard_command(&mut self, command: &str) -> usize {
        let before = self.queue.len();
        self.queue.retain(|inv| inv.command_name != command);
        before - self.queue.len()
    }

    /// Drops every waiting invocation and clears the busy flag. The caller is
    /// responsible for dropping the scheduled tick.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.busy = false;
    }
}
