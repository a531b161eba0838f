// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Timing Event System
//!
//! Periodic and one-shot events measured in sub CPU cycles. The expansion
//! unit's slow clocks hang off this:
//! - the 75 Hz disc tick (one sector at 1x speed)
//! - the 30.72 µs timer / stopwatch tick
//!
//! Unlike a downcount driven by the CPU loop, time is advanced in bulk once
//! per scheduler tick, so a periodic event may fire several times within a
//! single [`TimingEventManager::advance`] call. Each firing is reported
//! separately and in chronological order.
//!
//! # Example
//!
//! ```
//! use mcdrx::core::timing::TimingEventManager;
//!
//! let mut timing = TimingEventManager::new();
//! let timer = timing.register_periodic_event("Timer", 384);
//! timing.schedule(timer, 384);
//!
//! let fired = timing.advance(800);
//! assert_eq!(fired, vec![timer, timer]);
//! ```

/// Tick count type (relative time in sub CPU cycles)
pub type TickCount = u32;

/// Global tick counter type (absolute time in sub CPU cycles since reset)
pub type GlobalTicks = u64;

/// Event handle (identifier for registered events)
pub type EventHandle = usize;

/// Timing event
#[derive(Debug, Clone)]
pub struct TimingEvent {
    /// Event name (for debugging)
    pub name: &'static str,

    /// Next execution time (global ticks)
    pub next_run_time: GlobalTicks,

    /// Interval for periodic events (0 = one-shot)
    pub interval: TickCount,

    /// Whether this event is currently active
    pub active: bool,
}

/// Timing Event Manager
#[derive(Debug, Clone, Default)]
pub struct TimingEventManager {
    /// Global tick counter (absolute time since reset)
    global_tick_counter: GlobalTicks,

    /// Registered events, indexed by handle
    events: Vec<TimingEvent>,
}

impl TimingEventManager {
    /// Create a new timing event manager
    pub fn new() -> Self {
        Self {
            global_tick_counter: 0,
            events: Vec::new(),
        }
    }

    /// Register a one-shot event
    ///
    /// The event is inactive until [`schedule`](Self::schedule) is called.
    pub fn register_event(&mut self, name: &'static str) -> EventHandle {
        self.register_periodic_event(name, 0)
    }

    /// Register a periodic event with automatic rescheduling
    ///
    /// # Arguments
    ///
    /// * `name` - Event name for debugging
    /// * `interval` - Interval between executions (in sub CPU cycles)
    ///
    /// # Returns
    ///
    /// Event handle
    pub fn register_periodic_event(&mut self, name: &'static str, interval: TickCount) -> EventHandle {
        let handle = self.events.len();
        self.events.push(TimingEvent {
            name,
            next_run_time: 0,
            interval,
            active: false,
        });
        handle
    }

    /// Schedule an event to run `ticks` cycles from now
    pub fn schedule(&mut self, handle: EventHandle, ticks: TickCount) {
        let now = self.global_tick_counter;
        if let Some(event) = self.events.get_mut(handle) {
            event.next_run_time = now + ticks as GlobalTicks;
            event.active = true;
        }
    }

    /// Deactivate an event
    pub fn deactivate(&mut self, handle: EventHandle) {
        if let Some(event) = self.events.get_mut(handle) {
            event.active = false;
        }
    }

    /// Whether an event is scheduled
    pub fn is_active(&self, handle: EventHandle) -> bool {
        self.events.get(handle).is_some_and(|e| e.active)
    }

    /// Cycles until the event fires, if active
    pub fn ticks_until(&self, handle: EventHandle) -> Option<GlobalTicks> {
        self.events
            .get(handle)
            .filter(|e| e.active)
            .map(|e| e.next_run_time.saturating_sub(self.global_tick_counter))
    }

    /// Current global time
    pub fn now(&self) -> GlobalTicks {
        self.global_tick_counter
    }

    /// Advance time and collect the events that fired
    ///
    /// # Arguments
    ///
    /// * `ticks` - Sub CPU cycles elapsed
    ///
    /// # Returns
    ///
    /// Handles of triggered events, one entry per firing, earliest first
    pub fn advance(&mut self, ticks: TickCount) -> Vec<EventHandle> {
        let target = self.global_tick_counter + ticks as GlobalTicks;
        let mut fired: Vec<(GlobalTicks, EventHandle)> = Vec::new();

        for (handle, event) in self.events.iter_mut().enumerate() {
            while event.active && event.next_run_time <= target {
                fired.push((event.next_run_time, handle));
                log::trace!(
                    "Timing: Event '{}' at tick {}",
                    event.name,
                    event.next_run_time
                );
                if event.interval > 0 {
                    event.next_run_time += event.interval as GlobalTicks;
                } else {
                    event.active = false;
                }
            }
        }

        self.global_tick_counter = target;
        fired.sort_by_key(|&(time, handle)| (time, handle));
        fired.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Reset time to zero and deactivate all events
    ///
    /// Registrations survive, so existing handles stay valid.
    pub fn reset(&mut self) {
        self.global_tick_counter = 0;
        for event in &mut self.events {
            event.active = false;
            event.next_run_time = 0;
        }
    }

    pub(crate) fn snapshot(&self) -> (GlobalTicks, Vec<(bool, GlobalTicks)>) {
        (
            self.global_tick_counter,
            self.events
                .iter()
                .map(|e| (e.active, e.next_run_time))
                .collect(),
        )
    }

    pub(crate) fn restore(&mut self, now: GlobalTicks, events: &[(bool, GlobalTicks)]) {
        self.global_tick_counter = now;
        for (event, &(active, next)) in self.events.iter_mut().zip(events) {
            event.active = active;
            event.next_run_time = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_event() {
        let mut timing = TimingEventManager::new();
        let event = timing.register_event("Seek");
        timing.schedule(event, 1000);

        assert!(timing.advance(999).is_empty());
        assert_eq!(timing.advance(1), vec![event]);
        assert!(!timing.is_active(event));
        assert!(timing.advance(10_000).is_empty());
    }

    #[test]
    fn test_periodic_event_fires_per_interval() {
        let mut timing = TimingEventManager::new();
        let event = timing.register_periodic_event("Disc", 100);
        timing.schedule(event, 100);

        assert_eq!(timing.advance(350).len(), 3);
        assert_eq!(timing.ticks_until(event), Some(50));
    }

    #[test]
    fn test_events_in_chronological_order() {
        let mut timing = TimingEventManager::new();
        let slow = timing.register_periodic_event("Slow", 300);
        let fast = timing.register_periodic_event("Fast", 200);
        timing.schedule(slow, 300);
        timing.schedule(fast, 200);

        assert_eq!(timing.advance(600), vec![fast, slow, fast, slow, fast]);
    }

    #[test]
    fn test_inactive_event_never_fires() {
        let mut timing = TimingEventManager::new();
        let event = timing.register_periodic_event("Idle", 10);
        assert!(timing.advance(100).is_empty());
        assert_eq!(timing.ticks_until(event), None);

        timing.schedule(event, 10);
        timing.deactivate(event);
        assert!(timing.advance(100).is_empty());
    }

    #[test]
    fn test_reset_keeps_registrations() {
        let mut timing = TimingEventManager::new();
        let event = timing.register_periodic_event("Timer", 384);
        timing.schedule(event, 384);
        timing.advance(1000);

        timing.reset();
        assert_eq!(timing.now(), 0);
        assert!(!timing.is_active(event));

        timing.schedule(event, 384);
        assert_eq!(timing.advance(384), vec![event]);
    }
}
