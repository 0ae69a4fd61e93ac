// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The board contract the source resolver relies on.
//!
//! A channel's board selector chooses one of two endpoints (`ch1`, `ch2`);
//! concrete motor-driver UART tunnels, CRC tables and GPIO plumbing are board
//! glue and stay outside this crate (see the `Non-goals` in the top-level
//! design notes). Both endpoints implement this same trait.

/// One of the two external motor-controller endpoints a channel's board
/// selector can name. `Ch1` is the zero value, matching board selector bit 0.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BoardSelector {
    #[default]
    Ch1,
    Ch2,
}

impl BoardSelector {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Self::Ch2
        } else {
            Self::Ch1
        }
    }
}

/// A motor-controller endpoint as seen by the source resolver.
///
/// Any failure is reported as `Err(())`; the resolver never inspects the
/// reason, only the fact, and silently substitutes zero into the sample
/// stream (§7 `ResolverFailure`).
pub trait Board {
    fn get_parameter(&mut self, param_type: u8, motor: u8) -> Result<i32, ()>;
    /// `addr` is the full 24-bit `register_addr` field of a REGISTER or
    /// STACKED_REGISTER channel's address (§4.1); it does not fit in a byte.
    fn read_register(&mut self, motor: u8, addr: u32) -> Result<i32, ()>;
    fn write_register(&mut self, motor: u8, addr: u32, value: i32) -> Result<(), ()>;
}
