// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolves a single [`ChannelDescriptor`] to a 32-bit sample (§4.1).

use crate::board::Board;
use crate::channel::{ChannelDescriptor, ChannelKind};
use crate::hal::{AnalogInput, Hal};

/// Reads one channel's current value given its two possible board endpoints
/// and the HAL. `board` is whichever of `ch1`/`ch2` the descriptor's
/// [`BoardSelector`](crate::board::BoardSelector) names; the caller picks it
/// so this function stays generic over a single concrete board type rather
/// than needing both endpoints to share a type.
///
/// A board failure (`Err(())`) or an invalid analog input index is folded to
/// a sample value of `0` rather than propagated: a disconnected channel
/// should not stall the capture of every other channel (§7 `ResolverFailure`
/// is intentionally not a distinct `EngineError` variant; see `error.rs`).
///
/// The second tuple element reports whether this tick's value is a genuine
/// fold-to-zero rather than a real reading of `0`, so the caller can record
/// it as a `RamdebugEvent::ResolverFailure` (§10.1) without this function
/// reaching for `ringbuf`/`counters` itself — `resolve` stays a pure
/// function of its three arguments.
pub fn resolve(
    descriptor: &ChannelDescriptor,
    board: &mut impl Board,
    hal: &mut impl Hal,
) -> (u32, bool) {
    match descriptor.kind {
        ChannelKind::Disabled => (0, false),

        ChannelKind::Parameter => {
            let param_type = (descriptor.address & 0xFF) as u8;
            let motor = ((descriptor.address >> 24) & 0xFF) as u8;
            match board.get_parameter(param_type, motor) {
                Ok(v) => (v as u32, false),
                Err(()) => (0, true),
            }
        }

        ChannelKind::Register => {
            let motor = ((descriptor.address >> 24) & 0xFF) as u8;
            let addr = descriptor.address & 0x00FF_FFFF;
            match board.read_register(motor, addr) {
                Ok(v) => (v as u32, false),
                Err(()) => (0, true),
            }
        }

        // Read-modify-read-restore: write the stacked value into the stacked
        // address, read the data address, then write the original contents
        // of the stacked address back (§4.1). Any failing step folds the
        // whole channel to 0 for this tick, and the restore is still
        // attempted so later ticks don't observe a stuck stacked register.
        ChannelKind::StackedRegister => {
            let motor = ((descriptor.address >> 24) & 0xFF) as u8;
            let stacked_value = ((descriptor.address >> 16) & 0xFF) as i32;
            let stacked_addr = (descriptor.address >> 8) & 0xFF;
            let data_addr = descriptor.address & 0xFF;

            let original = board.read_register(motor, stacked_addr);
            let sample = match original {
                Ok(original) => {
                    let result = board
                        .write_register(motor, stacked_addr, stacked_value)
                        .and_then(|_| board.read_register(motor, data_addr));
                    let _ = board.write_register(motor, stacked_addr, original);
                    result
                }
                Err(()) => Err(()),
            };
            match sample {
                Ok(v) => (v as u32, false),
                Err(()) => (0, true),
            }
        }

        ChannelKind::Systick => (hal.tick(), false),

        ChannelKind::AnalogInput => {
            match AnalogInput::from_index(descriptor.address).and_then(|input| hal.read_analog(input)) {
                Some(v) => (v as u32, false),
                None => (0, true),
            }
        }
    }
}
