// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel descriptors: the unit the resolver and the control surface both
//! operate on.

use crate::board::BoardSelector;

/// The kind of data source a channel taps, and how its `address` field is
/// interpreted (§4.1).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ChannelKind {
    /// Slot is free; never sampled.
    #[default]
    Disabled,
    /// `address` is `[motor:8] .. [type:8]` (bits 31..24 and 7..0).
    Parameter,
    /// `address` is `[motor:8][register_addr:24]`.
    Register,
    /// `address` is `[motor:8][stacked_value:8][stacked_addr:8][data_addr:8]`.
    StackedRegister,
    /// `address` is ignored; yields the HAL's free-running tick.
    Systick,
    /// `address`'s low bits select one of the fixed analog/digital inputs.
    AnalogInput,
}

impl ChannelKind {
    /// Decodes the wire-level small integer used by the legacy split setters
    /// and by `set_channel`'s `type` argument.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Disabled),
            1 => Some(Self::Parameter),
            2 => Some(Self::Register),
            3 => Some(Self::StackedRegister),
            4 => Some(Self::Systick),
            5 => Some(Self::AnalogInput),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

/// A configured data source tap: one 32-bit word produced per sampling tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct ChannelDescriptor {
    pub kind: ChannelKind,
    pub board_selector: BoardSelector,
    pub address: u32,
}

impl ChannelDescriptor {
    pub const DISABLED: Self = Self {
        kind: ChannelKind::Disabled,
        board_selector: BoardSelector::Ch1,
        address: 0,
    };

    /// Splits a `set_channel`/`set_trigger_channel`-style packed word into
    /// `(board_selector, address)`: bit 16 selects the board, and the low 16
    /// bits carry the address. This composite call only ever addresses the
    /// low 16 bits; the split-field setters (`set_address`) are the way to
    /// reach a full 32-bit address for REGISTER/STACKED_REGISTER layouts.
    pub fn decompose_packed(packed: u32) -> (BoardSelector, u32) {
        let board_selector = BoardSelector::from_bit(packed & (1 << 16) != 0);
        let address = packed & 0xFFFF;
        (board_selector, address)
    }
}
