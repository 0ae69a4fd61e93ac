// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mask/shift/sign-extension arithmetic and edge detection for the trigger
//! channel (§4.3).

use crate::channel::ChannelDescriptor;

/// How the trigger channel's masked-and-shifted value is compared against
/// the threshold to decide when to fire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EdgeKind {
    /// Fires on the very first evaluation after arming, regardless of value.
    #[default]
    Unconditional,
    RisingSigned,
    FallingSigned,
    DualSigned,
    RisingUnsigned,
    FallingUnsigned,
    DualUnsigned,
}

impl EdgeKind {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Unconditional),
            1 => Some(Self::RisingSigned),
            2 => Some(Self::FallingSigned),
            3 => Some(Self::DualSigned),
            4 => Some(Self::RisingUnsigned),
            5 => Some(Self::FallingUnsigned),
            6 => Some(Self::DualUnsigned),
            _ => None,
        }
    }
}

/// A channel plus the comparator that decides when it fires.
#[derive(Copy, Clone, Debug, Default)]
pub struct TriggerDescriptor {
    pub channel: ChannelDescriptor,
    pub edge: EdgeKind,
    pub threshold: u32,
    pub mask: u32,
    pub shift: u8,
}

impl TriggerDescriptor {
    /// Defaults applied by `init()`: mask = all-ones, shift = 0, channel and
    /// edge kind both disabled/unconditional-at-rest.
    pub const DEFAULT: Self = Self {
        channel: ChannelDescriptor::DISABLED,
        edge: EdgeKind::Unconditional,
        threshold: 0,
        mask: u32::MAX,
        shift: 0,
    };
}

/// The masked/shifted/sign-extended view of a raw sample, computed once per
/// tick and compared in both polarities so either a signed or unsigned edge
/// kind can consult it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
struct Evaluation {
    masked: u32,
    signed: i32,
}

/// Computes `masked = (raw & mask) >> shift` and its sign-extended view,
/// treating the field as having the width of `mask >> shift` (§4.3 step 2-3,
/// §9 "prefer leading/trailing zero counts").
///
/// A post-shift mask of zero has width zero; by convention both the signed
/// and unsigned views are then zero, and no comparison can ever distinguish
/// values, so only `Unconditional` is meaningful with such a mask.
fn evaluate(raw: u32, mask: u32, shift: u8) -> Evaluation {
    let shifted_mask = mask.checked_shr(shift as u32).unwrap_or(0);
    let masked = (raw & mask).checked_shr(shift as u32).unwrap_or(0);
    let width = 32 - shifted_mask.leading_zeros();
    let signed = if width == 0 || width == 32 {
        masked as i32
    } else {
        let sign_bit = 1u32 << (width - 1);
        if masked & sign_bit != 0 {
            (masked | !shifted_mask) as i32
        } else {
            masked as i32
        }
    };
    Evaluation { masked, signed }
}

/// Running state for a single trigger channel: the last tick's above/below
/// verdicts, needed to detect edges on the *next* tick (§4.3 steps 5-8).
#[derive(Copy, Clone, Debug, Default)]
pub struct TriggerEvaluator {
    was_above_signed: bool,
    was_above_unsigned: bool,
    /// `Unconditional` triggers fire on the first evaluation only; this
    /// tracks whether that first evaluation has happened yet.
    armed_but_unevaluated: bool,
}

impl TriggerEvaluator {
    /// Performs the arm-time evaluation described in §4.3 step 5's
    /// parenthetical: initializes `was_above_*` from the current sample so
    /// the first tick in TRIGGER doesn't spuriously look like an edge.
    pub fn arm(&mut self, raw: u32, descriptor: &TriggerDescriptor) {
        let eval = evaluate(raw, descriptor.mask, descriptor.shift);
        self.was_above_signed = eval.signed > descriptor.threshold as i32;
        self.was_above_unsigned = eval.masked > descriptor.threshold;
        self.armed_but_unevaluated = true;
    }

    /// Evaluates one sampling tick against the trigger descriptor. Returns
    /// `true` exactly when the configured edge kind fires this tick (§4.3
    /// steps 1-8); always updates the cached `was_above_*` regardless.
    pub fn tick(&mut self, raw: u32, descriptor: &TriggerDescriptor) -> bool {
        let eval = evaluate(raw, descriptor.mask, descriptor.shift);
        let is_above_signed = eval.signed > descriptor.threshold as i32;
        let is_above_unsigned = eval.masked > descriptor.threshold;

        let fired = match descriptor.edge {
            EdgeKind::Unconditional => core::mem::take(&mut self.armed_but_unevaluated),
            EdgeKind::RisingSigned => !self.was_above_signed && is_above_signed,
            EdgeKind::FallingSigned => self.was_above_signed && !is_above_signed,
            EdgeKind::DualSigned => self.was_above_signed != is_above_signed,
            EdgeKind::RisingUnsigned => !self.was_above_unsigned && is_above_unsigned,
            EdgeKind::FallingUnsigned => self.was_above_unsigned && !is_above_unsigned,
            EdgeKind::DualUnsigned => self.was_above_unsigned != is_above_unsigned,
        };

        self.was_above_signed = is_above_signed;
        self.was_above_unsigned = is_above_unsigned;
        fired
    }
}
