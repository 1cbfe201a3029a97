// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tracked on/off and brightness values.

use serde::Serialize;

/// Last assumed state of a light.
///
/// Starts off with brightness 0. Only the light's turn on/off operations
/// change it.
///
/// # Examples
///
/// ```
/// use mochad_lib::state::LightState;
///
/// let state = LightState::new();
/// assert!(!state.is_on());
/// assert_eq!(state.brightness(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LightState {
    brightness: u8,
    is_on: bool,
}

impl LightState {
    /// Creates the initial state: off, brightness 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the assumed brightness (0-255).
    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Returns `true` if the light is assumed on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub(crate) fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    pub(crate) fn set_on(&mut self, on: bool) {
        self.is_on = on;
    }
}
