// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The capture state machine (§5) and its atomic wrapper.

use core::sync::atomic::{AtomicU8, Ordering};

/// One state in the capture lifecycle. Transitions are driven entirely by
/// `Engine::process` (§4.4); nothing else mutates state directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    /// No capture in progress; sampling is skipped entirely.
    Idle = 0,
    /// Filling the pretrigger portion of the buffer before the trigger can
    /// be armed.
    Pretrigger = 1,
    /// Pretrigger buffer full; armed and evaluating the trigger channel
    /// every tick, still sampling and overwriting the ring buffer.
    Trigger = 2,
    /// Trigger fired; sampling until the post-trigger portion is full.
    Capture = 3,
    /// Capture finished; buffer contents are stable and readable via
    /// `get_sample`.
    Complete = 4,
}

impl EngineState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Pretrigger,
            2 => Self::Trigger,
            3 => Self::Capture,
            _ => Self::Complete,
        }
    }
}

/// An `EngineState` stored behind an `AtomicU8`, so `get_sample` and friends
/// can inspect the current state from a different execution context than the
/// one driving `process()` without taking a lock (§5, §6).
#[derive(Debug, Default)]
pub struct AtomicState(AtomicU8);

impl AtomicState {
    pub const fn new(initial: EngineState) -> Self {
        Self(AtomicU8::new(initial as u8))
    }

    pub fn load(&self) -> EngineState {
        EngineState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, state: EngineState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Idle
    }
}
