// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for X10 device control.
//!
//! Each type is validated at construction, so configuration errors surface
//! when the configuration is loaded rather than when a command is sent.
//!
//! # Types
//!
//! - [`X10Address`] - House code and unit number (`a1` .. `p16`)
//! - [`CommType`] - Power-line or RF transmission
//! - [`BrightnessLevels`] - Dimming resolution (32, 64 or 256 levels)

mod address;
mod brightness;
mod comm_type;

pub use address::X10Address;
pub use brightness::BrightnessLevels;
pub use comm_type::CommType;
