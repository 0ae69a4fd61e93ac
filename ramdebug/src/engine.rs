// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The capture state machine, dispatcher and host-facing control surface
//! (§4.4, §4.5).

use core::sync::atomic::{AtomicBool, Ordering};

use counters::Count;
use static_assertions::const_assert_eq;

use crate::board::{Board, BoardSelector};
use crate::buffer::SampleBuffer;
use crate::channel::{ChannelDescriptor, ChannelKind};
use crate::error::EngineError;
use crate::hal::Hal;
use crate::resolver;
use crate::state::{AtomicState, EngineState};
use crate::trigger::{EdgeKind, TriggerDescriptor, TriggerEvaluator};

/// Diagnostic events recorded in this crate's ring buffer and/or counted in
/// `RAMDEBUG_COUNTERS` (§10.1). Internal observability only; never part of
/// the control surface.
///
/// `ProcessInvoked` and `SampleWritten` are counted only, never given a ring
/// entry: they fire on every `process()` call and every channel sample, far
/// too often for a 32-entry ring to usefully retain, which is exactly the
/// "aggregate observability without the cost of a full ring entry per
/// sample" tradeoff §10.1 calls for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Count)]
pub enum RamdebugEvent {
    #[count(skip)]
    None,
    Init,
    StateChanged { from: EngineState, to: EngineState },
    SetterRejected,
    Clamped,
    TriggerFired,
    ResolverFailure,
    ProcessInvoked,
    SampleWritten,
}

ringbuf::ringbuf!(RamdebugEvent, 32, RamdebugEvent::None);
counters::counters!(RAMDEBUG_COUNTERS, RamdebugEvent);

/// Info-query identifiers, bit-exact per §6.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum InfoKind {
    MaxChannels = 0,
    BufferSize = 1,
    SamplingFreq = 2,
    SampleNumber = 3,
}

impl InfoKind {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::MaxChannels),
            1 => Some(Self::BufferSize),
            2 => Some(Self::SamplingFreq),
            3 => Some(Self::SampleNumber),
            _ => None,
        }
    }
}

const_assert_eq!(InfoKind::MaxChannels as u8, 0);
const_assert_eq!(InfoKind::BufferSize as u8, 1);
const_assert_eq!(InfoKind::SamplingFreq as u8, 2);
const_assert_eq!(InfoKind::SampleNumber as u8, 3);

/// Index passed to `get_channel_type`/`get_channel_address` to name the
/// trigger channel rather than a slot in the channel array (§4.5).
pub const TRIGGER_CHANNEL_INDEX: u8 = 0xFF;

/// A channel field gathered one piece at a time by the legacy split setters,
/// committed to a real slot only once fully specified (§9 "split-field
/// channel setters").
#[derive(Copy, Clone, Debug, Default)]
struct PendingChannel {
    kind: Option<ChannelKind>,
    board_selector: Option<BoardSelector>,
    address: Option<u32>,
}

impl PendingChannel {
    fn take_if_complete(&mut self) -> Option<ChannelDescriptor> {
        let (kind, board_selector, address) =
            (self.kind?, self.board_selector?, self.address?);
        *self = Self::default();
        Some(ChannelDescriptor { kind, board_selector, address })
    }
}

/// The trace engine. `CHANNELS` is the number of data-channel slots;
/// `CAPACITY` is the sample ring buffer's size in words and must be a power
/// of two.
pub struct Engine<const CHANNELS: usize, const CAPACITY: usize> {
    channels: [ChannelDescriptor; CHANNELS],
    trigger: TriggerDescriptor,
    evaluator: TriggerEvaluator,
    buffer: SampleBuffer<CAPACITY>,
    pending_channel: PendingChannel,
    pending_trigger: PendingChannel,

    state: AtomicState,
    capture_enabled: AtomicBool,
    processing: AtomicBool,
    next_process_token: AtomicBool,

    prescaler: u32,
    prescaler_count: u32,
    sample_count: usize,
    pretrigger_count: usize,
    use_next_process: bool,
    sampling_freq_hz: u32,
}

impl<const CHANNELS: usize, const CAPACITY: usize> Engine<CHANNELS, CAPACITY> {
    pub fn new() -> Self {
        // `SampleBuffer::new` independently enforces this via its own
        // compile-time `MASK` constant; static_assertions can't yet assert
        // directly on a const generic parameter (see this codebase's
        // `i2c-devices` driver for the same caveat), so a plain assert here
        // documents the requirement at the point a caller would look.
        assert!(CAPACITY.is_power_of_two(), "CAPACITY must be a power of two");
        let mut engine = Self {
            channels: [ChannelDescriptor::DISABLED; CHANNELS],
            trigger: TriggerDescriptor::DEFAULT,
            evaluator: TriggerEvaluator::default(),
            buffer: SampleBuffer::new(),
            pending_channel: PendingChannel::default(),
            pending_trigger: PendingChannel::default(),
            state: AtomicState::new(EngineState::Idle),
            capture_enabled: AtomicBool::new(false),
            processing: AtomicBool::new(false),
            next_process_token: AtomicBool::new(false),
            prescaler: 1,
            prescaler_count: 0,
            sample_count: CAPACITY,
            pretrigger_count: 0,
            use_next_process: false,
            sampling_freq_hz: 0,
        };
        engine.init();
        engine
    }

    fn require_idle(&self) -> Result<(), EngineError> {
        if self.state.load() == EngineState::Idle {
            Ok(())
        } else {
            ringbuf::ringbuf_entry!(RamdebugEvent::SetterRejected);
            counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::SetterRejected);
            Err(EngineError::NotIdle)
        }
    }

    fn transition(&self, to: EngineState) {
        let from = self.state.load();
        self.state.store(to);
        ringbuf::ringbuf_entry!(RamdebugEvent::StateChanged { from, to });
        counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::StateChanged { from, to });
    }

    /// Records a fold-to-zero channel read (§7 `ResolverFailure`) in both the
    /// ring buffer and the counters, without naming which channel: the
    /// resolver itself stays free of diagnostics, see `resolver::resolve`.
    fn record_resolver_failure() {
        ringbuf::ringbuf_entry!(RamdebugEvent::ResolverFailure);
        counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::ResolverFailure);
    }

    // --- Control surface (§4.5) -------------------------------------------

    /// Resets the engine to its power-on defaults. Unconditionally safe to
    /// call from any state: disabling capture is the first action taken, so
    /// a concurrent sampling-context `process()` sees it stop immediately
    /// rather than racing a half-reset buffer (§5).
    pub fn init(&mut self) {
        self.capture_enabled.store(false, Ordering::Release);
        self.buffer.reset();
        self.channels = [ChannelDescriptor::DISABLED; CHANNELS];
        self.trigger = TriggerDescriptor::DEFAULT;
        self.evaluator = TriggerEvaluator::default();
        self.pending_channel = PendingChannel::default();
        self.pending_trigger = PendingChannel::default();
        self.prescaler = 1;
        self.prescaler_count = 0;
        self.sample_count = CAPACITY;
        self.pretrigger_count = 0;
        self.use_next_process = false;
        self.next_process_token.store(false, Ordering::Release);
        self.state.store(EngineState::Idle);
        ringbuf::ringbuf_entry!(RamdebugEvent::Init);
        counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::Init);
    }

    fn first_disabled_slot(&self) -> Option<usize> {
        self.channels.iter().position(|c| c.kind.is_disabled())
    }

    /// Composite, atomic channel setter: the preferred API (§4.5, §9).
    pub fn set_channel(&mut self, kind_raw: u8, packed: u32) -> Result<(), EngineError> {
        self.require_idle()?;
        let kind = ChannelKind::from_raw(kind_raw).ok_or(EngineError::InvalidChannelKind)?;
        let slot = self.first_disabled_slot().ok_or(EngineError::NoFreeSlot)?;
        let (board_selector, address) = ChannelDescriptor::decompose_packed(packed);
        self.channels[slot] = ChannelDescriptor { kind, board_selector, address };
        Ok(())
    }

    pub fn set_trigger_channel(&mut self, kind_raw: u8, packed: u32) -> Result<(), EngineError> {
        self.require_idle()?;
        let kind = ChannelKind::from_raw(kind_raw).ok_or(EngineError::InvalidChannelKind)?;
        let (board_selector, address) = ChannelDescriptor::decompose_packed(packed);
        self.trigger.channel = ChannelDescriptor { kind, board_selector, address };
        Ok(())
    }

    /// Legacy split setter: buffers `type` for the next channel to commit
    /// (§9 compatibility shim).
    pub fn set_type(&mut self, kind_raw: u8) -> Result<(), EngineError> {
        self.require_idle()?;
        let kind = ChannelKind::from_raw(kind_raw).ok_or(EngineError::InvalidChannelKind)?;
        self.pending_channel.kind = Some(kind);
        self.commit_pending_channel()
    }

    pub fn set_eval_channel(&mut self, board_selector_bit: bool) -> Result<(), EngineError> {
        self.require_idle()?;
        self.pending_channel.board_selector = Some(BoardSelector::from_bit(board_selector_bit));
        self.commit_pending_channel()
    }

    pub fn set_address(&mut self, address: u32) -> Result<(), EngineError> {
        self.require_idle()?;
        self.pending_channel.address = Some(address);
        self.commit_pending_channel()
    }

    fn commit_pending_channel(&mut self) -> Result<(), EngineError> {
        let Some(descriptor) = self.pending_channel.take_if_complete() else {
            return Ok(());
        };
        let slot = self.first_disabled_slot().ok_or(EngineError::NoFreeSlot)?;
        self.channels[slot] = descriptor;
        Ok(())
    }

    pub fn set_trigger_type(&mut self, kind_raw: u8) -> Result<(), EngineError> {
        self.require_idle()?;
        let kind = ChannelKind::from_raw(kind_raw).ok_or(EngineError::InvalidChannelKind)?;
        self.pending_trigger.kind = Some(kind);
        self.commit_pending_trigger();
        Ok(())
    }

    pub fn set_trigger_eval_channel(&mut self, board_selector_bit: bool) -> Result<(), EngineError> {
        self.require_idle()?;
        self.pending_trigger.board_selector = Some(BoardSelector::from_bit(board_selector_bit));
        self.commit_pending_trigger();
        Ok(())
    }

    pub fn set_trigger_address(&mut self, address: u32) -> Result<(), EngineError> {
        self.require_idle()?;
        self.pending_trigger.address = Some(address);
        self.commit_pending_trigger();
        Ok(())
    }

    fn commit_pending_trigger(&mut self) {
        if let Some(descriptor) = self.pending_trigger.take_if_complete() {
            self.trigger.channel = descriptor;
        }
    }

    pub fn set_trigger_mask_shift(&mut self, mask: u32, shift: u8) -> Result<(), EngineError> {
        self.require_idle()?;
        self.trigger.mask = mask;
        self.trigger.shift = shift;
        Ok(())
    }

    pub fn set_prescaler(&mut self, n: u32) -> Result<(), EngineError> {
        self.require_idle()?;
        self.prescaler = n.max(1);
        Ok(())
    }

    /// Clamped to capacity, never an error (§7 `ClampOnly`).
    pub fn set_sample_count(&mut self, n: usize) -> Result<(), EngineError> {
        self.require_idle()?;
        let clamped = n.min(CAPACITY);
        if clamped != n {
            ringbuf::ringbuf_entry!(RamdebugEvent::Clamped);
            counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::Clamped);
        }
        self.sample_count = clamped;
        if self.pretrigger_count > self.sample_count {
            self.pretrigger_count = self.sample_count;
        }
        Ok(())
    }

    /// Clamped to `sample_count`, never an error (§7 `ClampOnly`); also sets
    /// `write_index = n` so the pretrigger counter path alone suffices when
    /// `n < capacity` (§4.4).
    pub fn set_pretrigger_sample_count(&mut self, n: usize) -> Result<(), EngineError> {
        self.require_idle()?;
        let clamped = n.min(self.sample_count);
        if clamped != n {
            ringbuf::ringbuf_entry!(RamdebugEvent::Clamped);
            counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::Clamped);
        }
        self.pretrigger_count = clamped;
        self.buffer.set_write_index(clamped);
        Ok(())
    }

    /// Arms the trigger and promotes IDLE -> PRETRIGGER. `edge_raw` is the
    /// wire-level edge kind; an out-of-range value or a non-UNCONDITIONAL
    /// kind with no trigger channel configured is rejected (§4.5).
    pub fn enable_trigger(
        &mut self,
        edge_raw: u8,
        threshold: u32,
        ch1: &mut impl Board,
        ch2: &mut impl Board,
        hal: &mut impl Hal,
    ) -> Result<(), EngineError> {
        self.require_idle()?;
        let edge = EdgeKind::from_raw(edge_raw).ok_or(EngineError::InvalidEdgeKind)?;
        if edge != EdgeKind::Unconditional && self.trigger.channel.kind.is_disabled() {
            return Err(EngineError::NoTriggerChannel);
        }
        self.trigger.edge = edge;
        self.trigger.threshold = threshold;

        let raw = self.resolve_trigger_channel(ch1, ch2, hal);
        self.evaluator.arm(raw, &self.trigger);

        self.capture_enabled.store(true, Ordering::Release);
        self.transition(EngineState::Pretrigger);
        // A zero-length pretrigger window needs no ticks to fill; promote
        // right away rather than waiting for the first `process()` call to
        // notice (§4.4).
        if self.pretrigger_wrapped_or_filled(false) {
            self.transition(EngineState::Trigger);
        }
        Ok(())
    }

    pub fn get_sample(&self, i: usize) -> Result<u32, EngineError> {
        match self.state.load() {
            EngineState::Complete => Ok(self.buffer.sample_at(i)),
            EngineState::Capture if i <= self.buffer.written_since_start() => {
                Ok(self.buffer.sample_at(i))
            }
            _ => Err(EngineError::SampleUnavailable),
        }
    }

    pub fn get_state(&self) -> EngineState {
        self.state.load()
    }

    pub fn get_channel_type(&self, index: u8) -> Result<ChannelKind, EngineError> {
        if index == TRIGGER_CHANNEL_INDEX {
            return Ok(self.trigger.channel.kind);
        }
        self.channels
            .get(index as usize)
            .map(|c| c.kind)
            .ok_or(EngineError::InvalidChannelKind)
    }

    pub fn get_channel_address(&self, index: u8) -> Result<u32, EngineError> {
        if index == TRIGGER_CHANNEL_INDEX {
            return Ok(self.trigger.channel.address);
        }
        self.channels
            .get(index as usize)
            .map(|c| c.address)
            .ok_or(EngineError::InvalidChannelKind)
    }

    pub fn get_sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn get_pretrigger_sample_count(&self) -> usize {
        self.pretrigger_count
    }

    pub fn get_info(&self, kind: InfoKind) -> u32 {
        match kind {
            InfoKind::MaxChannels => CHANNELS as u32,
            InfoKind::BufferSize => CAPACITY as u32,
            InfoKind::SamplingFreq => self.sampling_freq_hz,
            InfoKind::SampleNumber => self.buffer.write_index() as u32,
        }
    }

    /// Stores the sampling frequency for later reporting; has no effect on
    /// the actual cadence, which the HAL owns (§4.5).
    pub fn update_frequency(&mut self, hz: u32) {
        self.sampling_freq_hz = hz;
    }

    pub fn set_global_enable(&mut self, enable: bool) {
        self.capture_enabled.store(enable, Ordering::Release);
    }

    pub fn use_next_process(&mut self, enable: bool) {
        self.use_next_process = enable;
    }

    /// Grants a single-shot token permitting the next sampling tick, for
    /// coordination with a main-loop pre-processing step (§4.4).
    pub fn next_process(&mut self) {
        self.next_process_token.store(true, Ordering::Release);
    }

    // --- Sampling context (§4.4) -------------------------------------------

    fn resolve_trigger_channel(
        &self,
        ch1: &mut impl Board,
        ch2: &mut impl Board,
        hal: &mut impl Hal,
    ) -> u32 {
        let (raw, failed) = match self.trigger.channel.board_selector {
            BoardSelector::Ch1 => resolver::resolve(&self.trigger.channel, ch1, hal),
            BoardSelector::Ch2 => resolver::resolve(&self.trigger.channel, ch2, hal),
        };
        if failed {
            Self::record_resolver_failure();
        }
        raw
    }

    /// Writes one word per enabled channel, in array order.
    ///
    /// `check_completion` is `true` exactly when the buffer's `start_index`
    /// has already been latched this tick (state is or just became
    /// CAPTURE); in PRETRIGGER there is nothing yet to complete against, so
    /// it is always `false` there. When completion fires mid-loop, the
    /// remaining enabled channels of this tick are not sampled (§4.4).
    ///
    /// Returns `(wrapped, completed)`: whether any push wrapped the write
    /// cursor back to zero (the PRETRIGGER wrap path), and whether this call
    /// drove a CAPTURE -> COMPLETE transition.
    fn sample_tick(
        &mut self,
        ch1: &mut impl Board,
        ch2: &mut impl Board,
        hal: &mut impl Hal,
        check_completion: bool,
    ) -> (bool, bool) {
        let mut wrapped = false;
        for i in 0..CHANNELS {
            let descriptor = self.channels[i];
            if descriptor.kind.is_disabled() {
                continue;
            }
            let (raw, failed) = match descriptor.board_selector {
                BoardSelector::Ch1 => resolver::resolve(&descriptor, ch1, hal),
                BoardSelector::Ch2 => resolver::resolve(&descriptor, ch2, hal),
            };
            if failed {
                Self::record_resolver_failure();
            }
            counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::SampleWritten);
            wrapped |= self.buffer.push(raw);

            if check_completion {
                let written = self.buffer.written_since_start();
                if written == 0 || written >= self.sample_count {
                    self.capture_enabled.store(false, Ordering::Release);
                    self.transition(EngineState::Complete);
                    return (wrapped, true);
                }
            }
        }
        (wrapped, false)
    }

    fn pretrigger_wrapped_or_filled(&self, wrapped_this_tick: bool) -> bool {
        wrapped_this_tick || self.buffer.write_index() >= self.pretrigger_count
    }

    /// The sampling-context entry point, invoked at the configured sampling
    /// frequency (§4.4, §6). Re-entrant calls (the same interrupt
    /// preempting itself, or a second call site) are dropped.
    pub fn process(&mut self, ch1: &mut impl Board, ch2: &mut impl Board, hal: &mut impl Hal) {
        if self.processing.swap(true, Ordering::Acquire) {
            return;
        }

        counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::ProcessInvoked);
        self.process_gated(ch1, ch2, hal);

        self.processing.store(false, Ordering::Release);
    }

    /// Applies the global enable and next-process gates, then the prescaler,
    /// then dispatches per state (§4.4). The prescaler divides only the
    /// sampler's cadence: the trigger evaluator still runs on every tick
    /// that passes the enable/gating checks, so a prescaled trigger channel
    /// is still evaluated promptly, and only buffer writes are throttled.
    fn process_gated(&mut self, ch1: &mut impl Board, ch2: &mut impl Board, hal: &mut impl Hal) {
        if !self.capture_enabled.load(Ordering::Acquire) {
            return;
        }
        if self.use_next_process && !self.next_process_token.swap(false, Ordering::Acquire) {
            return;
        }

        self.prescaler_count += 1;
        let should_sample = self.prescaler_count >= self.prescaler;
        if should_sample {
            self.prescaler_count = 0;
        }

        match self.state.load() {
            EngineState::Idle | EngineState::Complete => {}

            EngineState::Pretrigger => {
                if should_sample {
                    let (wrapped, _) = self.sample_tick(ch1, ch2, hal, false);
                    if self.pretrigger_wrapped_or_filled(wrapped) {
                        self.transition(EngineState::Trigger);
                    }
                }
            }

            EngineState::Trigger => {
                let raw = self.resolve_trigger_channel(ch1, ch2, hal);
                let fired = self.evaluator.tick(raw, &self.trigger);
                let mut just_captured = false;
                if fired {
                    ringbuf::ringbuf_entry!(RamdebugEvent::TriggerFired);
                    counters::count!(RAMDEBUG_COUNTERS, RamdebugEvent::TriggerFired);
                    self.buffer.latch_start(self.pretrigger_count);
                    self.transition(EngineState::Capture);
                    just_captured = true;
                }
                if should_sample {
                    self.sample_tick(ch1, ch2, hal, just_captured);
                }
            }

            EngineState::Capture => {
                if should_sample {
                    self.sample_tick(ch1, ch2, hal, true);
                }
            }
        }
    }
}

impl<const CHANNELS: usize, const CAPACITY: usize> Default for Engine<CHANNELS, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod fakes {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use crate::board::Board;
    use crate::hal::{AnalogInput, Hal};

    /// Modeled on this codebase's `multitimer` syscall fakes: a
    /// thread-local-backed double so tests can run host-side without a real
    /// board or HAL. Each endpoint is independent; `FakeBoard` is one
    /// endpoint, so tests instantiate two for `ch1`/`ch2`.
    #[derive(Default)]
    pub struct FakeBoard {
        parameters: RefCell<HashMap<(u8, u8), Result<i32, ()>>>,
        registers: RefCell<HashMap<(u8, u32), i32>>,
        register_fails: RefCell<bool>,
        pub write_log: RefCell<Vec<(u8, u32, i32)>>,
    }

    impl FakeBoard {
        pub fn set_parameter(&self, param_type: u8, motor: u8, value: Result<i32, ()>) {
            self.parameters.borrow_mut().insert((param_type, motor), value);
        }

        pub fn set_register(&self, motor: u8, addr: u32, value: i32) {
            self.registers.borrow_mut().insert((motor, addr), value);
        }

        pub fn fail_registers(&self, fail: bool) {
            *self.register_fails.borrow_mut() = fail;
        }
    }

    impl Board for FakeBoard {
        fn get_parameter(&mut self, param_type: u8, motor: u8) -> Result<i32, ()> {
            self.parameters
                .borrow()
                .get(&(param_type, motor))
                .copied()
                .unwrap_or(Ok(0))
        }

        fn read_register(&mut self, motor: u8, addr: u32) -> Result<i32, ()> {
            if *self.register_fails.borrow() {
                return Err(());
            }
            Ok(*self.registers.borrow().get(&(motor, addr)).unwrap_or(&0))
        }

        fn write_register(&mut self, motor: u8, addr: u32, value: i32) -> Result<(), ()> {
            if *self.register_fails.borrow() {
                return Err(());
            }
            self.write_log.borrow_mut().push((motor, addr, value));
            self.registers.borrow_mut().insert((motor, addr), value);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeHal {
        pub tick: u32,
        analog: RefCell<HashMap<&'static str, i32>>,
    }

    impl FakeHal {
        fn key(input: AnalogInput) -> &'static str {
            match input {
                AnalogInput::Ain0 => "ain0",
                AnalogInput::Ain1 => "ain1",
                AnalogInput::Ain2 => "ain2",
                AnalogInput::Dio4 => "dio4",
                AnalogInput::Dio5 => "dio5",
                AnalogInput::Vm => "vm",
            }
        }

        pub fn set_analog(&self, input: AnalogInput, value: i32) {
            self.analog.borrow_mut().insert(Self::key(input), value);
        }
    }

    impl Hal for FakeHal {
        fn tick(&mut self) -> u32 {
            self.tick
        }

        fn read_analog(&mut self, input: AnalogInput) -> Option<i32> {
            self.analog.borrow().get(Self::key(input)).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSelector;
    use crate::channel::ChannelKind;
    use crate::hal::AnalogInput;
    use fakes::{FakeBoard, FakeHal};

    type TestEngine = Engine<4, 16>;

    fn pack(board_selector_bit: bool, address: u16) -> u32 {
        ((board_selector_bit as u32) << 16) | address as u32
    }

    #[test]
    fn init_resets_universal_properties() {
        let mut engine = TestEngine::new();
        engine.set_sample_count(5).unwrap();
        engine.init();

        assert_eq!(engine.get_state(), EngineState::Idle);
        assert_eq!(engine.get_sample_count(), 16);
        assert_eq!(engine.get_pretrigger_sample_count(), 0);
        assert_eq!(engine.get_channel_type(0).unwrap(), ChannelKind::Disabled);
        assert_eq!(engine.get_channel_type(TRIGGER_CHANNEL_INDEX).unwrap(), ChannelKind::Disabled);
        assert_eq!(engine.get_info(InfoKind::SampleNumber), 0);
    }

    #[test]
    fn setters_reject_outside_idle() {
        let mut engine = TestEngine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();
        engine.enable_trigger(0, 0, &mut ch1, &mut ch2, &mut hal).unwrap();
        assert_eq!(engine.get_state(), EngineState::Pretrigger);

        assert_eq!(engine.set_sample_count(4), Err(EngineError::NotIdle));
        assert_eq!(engine.set_prescaler(2), Err(EngineError::NotIdle));
        assert_eq!(engine.set_channel(1, 0), Err(EngineError::NotIdle));
    }

    // S1: unconditional single-channel capture.
    #[test]
    fn s1_unconditional_single_channel() {
        let mut engine = TestEngine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();

        engine.set_channel(ChannelKind::Systick as u8, pack(false, 0)).unwrap();
        engine.set_sample_count(10).unwrap();
        engine.enable_trigger(EdgeKind::Unconditional as u8, 0, &mut ch1, &mut ch2, &mut hal).unwrap();

        for i in 0..10u32 {
            hal.tick = i;
            engine.process(&mut ch1, &mut ch2, &mut hal);
        }

        assert_eq!(engine.get_state(), EngineState::Complete);
        for i in 0..10usize {
            assert_eq!(engine.get_sample(i).unwrap(), i as u32);
        }
    }

    // S2 / S3 exercise the trigger evaluator directly in trigger.rs; here we
    // check that a rising-edge trigger on a parameter channel actually moves
    // the engine through PRETRIGGER -> TRIGGER -> CAPTURE.
    #[test]
    fn rising_edge_trigger_reaches_capture() {
        let mut engine: Engine<4, 8> = Engine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();

        engine.set_trigger_channel(ChannelKind::Parameter as u8, pack(false, 0)).unwrap();
        engine.set_trigger_mask_shift(0x0000_FF00, 8).unwrap();
        engine.set_sample_count(4).unwrap();
        engine.set_pretrigger_sample_count(0).unwrap();
        ch1.set_parameter(0, 0, Ok(0x0000));
        engine
            .enable_trigger(EdgeKind::RisingSigned as u8, 0, &mut ch1, &mut ch2, &mut hal)
            .unwrap();
        assert_eq!(engine.get_state(), EngineState::Trigger); // pretrigger_count == 0: promoted immediately

        ch1.set_parameter(0, 0, Ok(0x7F00));
        engine.process(&mut ch1, &mut ch2, &mut hal);
        assert_eq!(engine.get_state(), EngineState::Capture);
    }

    // S4: the window returned after COMPLETE contains `pretrigger_count`
    // real samples predating the trigger tick, even though the PRETRIGGER
    // state itself was instantaneous (the preset write_index already
    // satisfied the counter-path condition at arm time; see DESIGN.md).
    #[test]
    fn s4_pretrigger_window() {
        let mut engine: Engine<4, 16> = Engine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();

        engine.set_channel(ChannelKind::Systick as u8, pack(false, 0)).unwrap();
        engine.set_trigger_channel(ChannelKind::Systick as u8, pack(false, 0)).unwrap();
        engine.set_sample_count(8).unwrap();
        engine.set_pretrigger_sample_count(4).unwrap();
        engine
            .enable_trigger(EdgeKind::RisingSigned as u8, 5, &mut ch1, &mut ch2, &mut hal)
            .unwrap();
        assert_eq!(engine.get_state(), EngineState::Trigger);

        for tick in 1..=9u32 {
            hal.tick = tick;
            engine.process(&mut ch1, &mut ch2, &mut hal);
        }

        assert_eq!(engine.get_state(), EngineState::Complete);
        let samples: Vec<u32> = (0..8).map(|i| engine.get_sample(i).unwrap()).collect();
        assert_eq!(samples, [2, 3, 4, 5, 6, 7, 8, 9]);
        // The trigger fired on tick 6 (first tick where 6 > threshold 5);
        // exactly 4 of the 8 stored samples (2, 3, 4, 5) predate it.
        assert_eq!(samples.iter().filter(|&&v| v < 6).count(), 4);
    }

    #[test]
    fn resolver_failure_folds_to_zero_in_capture() {
        let mut engine: Engine<4, 8> = Engine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();

        engine.set_channel(ChannelKind::Register as u8, pack(false, 0)).unwrap();
        engine.set_sample_count(2).unwrap();
        ch1.fail_registers(true);
        engine
            .enable_trigger(EdgeKind::Unconditional as u8, 0, &mut ch1, &mut ch2, &mut hal)
            .unwrap();
        engine.process(&mut ch1, &mut ch2, &mut hal);
        engine.process(&mut ch1, &mut ch2, &mut hal);

        assert_eq!(engine.get_state(), EngineState::Complete);
        assert_eq!(engine.get_sample(0).unwrap(), 0);
    }

    // S5: prescaler divides the sampling cadence.
    #[test]
    fn s5_prescaler_divides_cadence() {
        let mut engine: Engine<4, 8> = Engine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();

        engine.set_channel(ChannelKind::Systick as u8, pack(false, 0)).unwrap();
        engine.set_prescaler(4).unwrap();
        engine.set_sample_count(3).unwrap();
        engine
            .enable_trigger(EdgeKind::Unconditional as u8, 0, &mut ch1, &mut ch2, &mut hal)
            .unwrap();

        for tick in 1..=12u32 {
            hal.tick = tick;
            engine.process(&mut ch1, &mut ch2, &mut hal);
        }

        assert_eq!(engine.get_state(), EngineState::Complete);
        let samples: Vec<u32> = (0..3).map(|i| engine.get_sample(i).unwrap()).collect();
        assert_eq!(samples, [4, 8, 12]);
    }

    // S6: init() cancels an in-flight capture.
    #[test]
    fn s6_init_cancels_capture() {
        let mut engine: Engine<4, 8> = Engine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();

        engine.set_channel(ChannelKind::Systick as u8, pack(false, 0)).unwrap();
        engine
            .enable_trigger(EdgeKind::Unconditional as u8, 0, &mut ch1, &mut ch2, &mut hal)
            .unwrap();
        assert_ne!(engine.get_state(), EngineState::Idle);

        engine.init();
        assert_eq!(engine.get_state(), EngineState::Idle);
        assert!(engine.get_sample(0).is_err());
    }

    #[test]
    fn legacy_split_setters_commit_only_once_complete() {
        let mut engine: Engine<4, 8> = Engine::new();
        engine.set_type(ChannelKind::AnalogInput as u8).unwrap();
        // Not committed yet: still disabled.
        assert_eq!(engine.get_channel_type(0).unwrap(), ChannelKind::Disabled);
        engine.set_eval_channel(false).unwrap();
        assert_eq!(engine.get_channel_type(0).unwrap(), ChannelKind::Disabled);
        engine.set_address(6).unwrap(); // VM
        assert_eq!(engine.get_channel_type(0).unwrap(), ChannelKind::AnalogInput);
        assert_eq!(engine.get_channel_address(0).unwrap(), 6);
    }

    #[test]
    fn analog_input_channel_reads_hal() {
        let mut engine: Engine<4, 8> = Engine::new();
        let mut ch1 = FakeBoard::default();
        let mut ch2 = FakeBoard::default();
        let mut hal = FakeHal::default();

        engine.set_channel(ChannelKind::AnalogInput as u8, pack(false, 0)).unwrap(); // AIN0
        engine.set_sample_count(1).unwrap();
        hal.set_analog(AnalogInput::Ain0, 0x2A);
        engine
            .enable_trigger(EdgeKind::Unconditional as u8, 0, &mut ch1, &mut ch2, &mut hal)
            .unwrap();
        engine.process(&mut ch1, &mut ch2, &mut hal);

        assert_eq!(engine.get_state(), EngineState::Complete);
        assert_eq!(engine.get_sample(0).unwrap(), 0x2A);
    }

    #[test]
    fn get_info_reports_static_and_dynamic_values() {
        let engine: Engine<4, 8> = Engine::new();
        assert_eq!(engine.get_info(InfoKind::MaxChannels), 4);
        assert_eq!(engine.get_info(InfoKind::BufferSize), 8);
        assert_eq!(engine.get_info(InfoKind::SampleNumber), 0);
    }
}
