// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed errors for the trace engine's control surface.

/// Everything that can keep a control-surface operation from completing.
///
/// Every setter in [`crate::engine::Engine`] returns `Result<(), EngineError>`
/// rather than a bare `bool`; callers that only want the legacy true/false
/// contract can collapse it with `.is_ok()`.
///
/// `ResolverFailure` and clamped setters are deliberately absent here: a
/// resolver failure is silently folded into a zero sample (and only visible
/// through the diagnostics counters), and an out-of-range sample or
/// pretrigger count is clamped rather than rejected. Neither is a control
/// surface error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A setter was called while the engine was not `Idle`.
    NotIdle,
    /// An out-of-range channel source kind was supplied.
    InvalidChannelKind,
    /// An out-of-range trigger edge kind was supplied.
    InvalidEdgeKind,
    /// `enable_trigger` was called with an edge kind other than
    /// `Unconditional` while the trigger channel is `Disabled`.
    NoTriggerChannel,
    /// `set_channel` (or the split-field shim) found no free channel slot.
    NoFreeSlot,
    /// `get_sample` was called outside of `Complete`, or outside the
    /// already-written portion of `Capture`.
    SampleUnavailable,
}
