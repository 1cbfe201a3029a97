// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! X10 command vocabulary understood by mochad.
//!
//! A command is the function part of a mochad line. The device handle
//! prefixes it with the comm type and address, so `X10Command::Dim(5)` sent
//! to power-line unit `a1` becomes `pl a1 dim 5`.
//!
//! | Command | Wire form | Meaning |
//! |---------|-----------|---------|
//! | [`X10Command::On`] | `on` | Switch on (classic modules restore full brightness) |
//! | [`X10Command::Off`] | `off` | Switch off |
//! | [`X10Command::Dim`] | `dim <n>` | Lower brightness by `n` steps |
//! | [`X10Command::Bright`] | `bright <n>` | Raise brightness by `n` steps |
//! | [`X10Command::Xdim`] | `xdim <n>` | Set absolute level on extended modules |
//!
//! # Examples
//!
//! ```
//! use mochad_lib::command::X10Command;
//!
//! assert_eq!(X10Command::On.to_string(), "on");
//! assert_eq!(X10Command::Xdim(31).to_string(), "xdim 31");
//! ```

use std::fmt;

/// A single X10 function sent to one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum X10Command {
    /// Switch the module on.
    On,
    /// Switch the module off.
    Off,
    /// Dim by a number of steps.
    Dim(u8),
    /// Brighten by a number of steps.
    Bright(u8),
    /// Set an absolute extended dim level.
    Xdim(u8),
}

impl X10Command {
    /// Returns the function keyword without its argument.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Dim(_) => "dim",
            Self::Bright(_) => "bright",
            Self::Xdim(_) => "xdim",
        }
    }

    /// Returns the numeric argument, if the function takes one.
    #[must_use]
    pub const fn argument(&self) -> Option<u8> {
        match self {
            Self::On | Self::Off => None,
            Self::Dim(n) | Self::Bright(n) | Self::Xdim(n) => Some(*n),
        }
    }
}

impl fmt::Display for X10Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(n) => write!(f, "{} {n}", self.keyword()),
            None => f.write_str(self.keyword()),
        }
    }
}
