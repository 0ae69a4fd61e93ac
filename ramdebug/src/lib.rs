// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RAM-based trace engine for motion-control evaluation firmware.
//!
//! Periodically samples a small set of configurable data sources (motor
//! parameters, peripheral registers, analog inputs, a free-running tick) into
//! a fixed-size ring buffer, evaluates a trigger condition on one of those
//! sources, and freezes a windowed capture — with user-selectable pre-trigger
//! history — for a host debugger to retrieve. See [`engine::Engine`] for the
//! control surface and [`engine::Engine::process`] for the sampling entry
//! point.
#![cfg_attr(target_os = "none", no_std)]

pub mod board;
pub mod buffer;
pub mod channel;
pub mod engine;
pub mod error;
pub mod hal;
pub mod resolver;
pub mod state;
pub mod trigger;

pub use board::{Board, BoardSelector};
pub use channel::{ChannelDescriptor, ChannelKind};
pub use engine::{Engine, InfoKind};
pub use error::EngineError;
pub use hal::{AnalogInput, Hal};
pub use state::EngineState;
pub use trigger::{EdgeKind, TriggerDescriptor};
