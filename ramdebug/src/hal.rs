// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The HAL contract the sampling context relies on.
//!
//! The concrete tick source and ADC are board glue and live outside this
//! crate; only the contract is specified here, in the same spirit as this
//! codebase's `embedded-hal` traits.

/// One of the fixed analog/digital inputs the resolver can sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AnalogInput {
    Ain0,
    Ain1,
    Ain2,
    Dio4,
    Dio5,
    Vm,
}

impl AnalogInput {
    /// Maps the small index used by `ANALOG_INPUT` channels to the input it
    /// names, per the fixed table `{0:AIN0, 1:AIN1, 2:AIN2, 3:DIO4, 4:DIO5,
    /// 6:VM}`. Index 5 and anything above 6 have no mapping.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Ain0),
            1 => Some(Self::Ain1),
            2 => Some(Self::Ain2),
            3 => Some(Self::Dio4),
            4 => Some(Self::Dio5),
            6 => Some(Self::Vm),
            _ => None,
        }
    }
}

/// Hardware services consumed by the source resolver: a monotonic tick
/// counter and the fixed set of analog/digital inputs.
///
/// Implementors own the actual timer and ADC peripherals; this crate never
/// touches hardware directly.
pub trait Hal {
    /// Reads the free-running tick counter backing `SYSTICK` channels and the
    /// sampling interrupt cadence.
    fn tick(&mut self) -> u32;

    /// Reads one of the fixed analog/digital inputs. A `None` return is
    /// treated by the resolver as a resolver failure (folded to zero).
    fn read_analog(&mut self, input: AnalogInput) -> Option<i32>;
}
