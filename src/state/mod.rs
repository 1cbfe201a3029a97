// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assumed light state.
//!
//! X10 is one-way: the dimmers never report back, so the state of a light is
//! what the last successful command sequence should have left it in.

mod light_state;

pub use light_state::LightState;
