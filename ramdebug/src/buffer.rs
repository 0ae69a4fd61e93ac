// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The fixed-capacity 32-bit sample ring buffer (§4.2).
//!
//! This is deliberately its own type rather than a reuse of this codebase's
//! `circq`: `circq` is a byte-oriented enqueue/dequeue queue, while the trace
//! engine needs absolute-offset indexed overwrite with two independently
//! managed cursors (`write_index`, `start_index`). The capacity-as-bitmask
//! trick it uses for wraparound is kept here too.

/// A fixed-capacity circular store of 32-bit samples.
///
/// `CAPACITY` must be a power of two, so that index wraparound is a bitmask
/// rather than a division; this is asserted at construction.
pub struct SampleBuffer<const CAPACITY: usize> {
    data: [u32; CAPACITY],
    write_index: usize,
    start_index: usize,
}

impl<const CAPACITY: usize> SampleBuffer<CAPACITY> {
    const MASK: usize = {
        assert!(CAPACITY.is_power_of_two(), "CAPACITY must be a power of two");
        CAPACITY - 1
    };

    pub const fn new() -> Self {
        Self {
            data: [0; CAPACITY],
            write_index: 0,
            start_index: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        CAPACITY
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Clears the buffer and resets both cursors to zero, per `init()`.
    pub fn reset(&mut self) {
        self.data = [0; CAPACITY];
        self.write_index = 0;
        self.start_index = 0;
    }

    /// Writes one sample at `write_index` and advances it, wrapping modulo
    /// `CAPACITY`. Returns whether the write cursor just wrapped back to
    /// zero, which drives the PRETRIGGER wrap-path (§4.4).
    pub fn push(&mut self, value: u32) -> bool {
        self.data[self.write_index & Self::MASK] = value;
        self.write_index = (self.write_index + 1) & Self::MASK;
        self.write_index == 0
    }

    /// Directly sets the write cursor, used by `set_pretrigger_sample_count`
    /// (§4.4: "sets `write_index = k` so that the counter path alone
    /// suffices").
    pub fn set_write_index(&mut self, index: usize) {
        self.write_index = index & Self::MASK;
    }

    /// Latches `start_index = (write_index - pretrigger_count) mod capacity`
    /// at trigger fire (§4.3 step 7).
    pub fn latch_start(&mut self, pretrigger_count: usize) {
        self.start_index =
            (self.write_index + CAPACITY - (pretrigger_count & Self::MASK)) & Self::MASK;
    }

    /// `written = (write_index - start_index + capacity) mod capacity`
    /// (§4.4): the number of samples written since `start_index`, modulo
    /// capacity. A freshly-latched buffer with no further writes reports 0,
    /// and the CAPTURE->COMPLETE check treats that as "wrapped full circle"
    /// rather than "nothing written yet" (§4.4, §9 open question).
    pub fn written_since_start(&self) -> usize {
        (self.write_index + CAPACITY - self.start_index) & Self::MASK
    }

    /// Absolute-offset read: `buffer[(start_index + i) mod capacity]`.
    pub fn sample_at(&self, i: usize) -> u32 {
        self.data[(self.start_index + i) & Self::MASK]
    }
}

impl<const CAPACITY: usize> Default for SampleBuffer<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
