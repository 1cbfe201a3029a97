// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dimming resolution of X10 modules.
//!
//! Hosts express brightness on a 0-255 scale. X10 modules only understand a
//! fixed number of discrete steps, so every value sent to mochad is rescaled
//! to the module's resolution first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Number of discrete brightness steps a module supports.
///
/// Classic X10 lamp modules have 32 levels and only understand relative
/// `dim`/`bright` steps; extended modules accept an absolute `xdim` with 64
/// or 256 levels.
///
/// # Examples
///
/// ```
/// use mochad_lib::types::BrightnessLevels;
///
/// let levels = BrightnessLevels::try_from(64).unwrap();
/// assert_eq!(levels.max_step(), 63);
/// assert_eq!(levels.scale(128), 31);
/// assert!(BrightnessLevels::try_from(100).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BrightnessLevels {
    /// 32 levels, relative dimming only.
    #[default]
    Levels32,
    /// 64 levels, absolute `xdim`.
    Levels64,
    /// 256 levels, absolute `xdim`.
    Levels256,
}

impl BrightnessLevels {
    /// Returns the number of levels.
    #[must_use]
    pub const fn count(&self) -> u16 {
        match self {
            Self::Levels32 => 32,
            Self::Levels64 => 64,
            Self::Levels256 => 256,
        }
    }

    /// Returns the highest step index (`count - 1`).
    #[must_use]
    pub const fn max_step(&self) -> u8 {
        match self {
            Self::Levels32 => 31,
            Self::Levels64 => 63,
            Self::Levels256 => 255,
        }
    }

    /// Returns `true` if the module takes absolute `xdim` levels.
    #[must_use]
    pub const fn is_extended(&self) -> bool {
        !matches!(self, Self::Levels32)
    }

    /// Rescales a 0-255 value (an absolute level or a delta) to module steps.
    ///
    /// Truncates toward zero: `floor(value * max_step / 255)`.
    #[must_use]
    pub fn scale(&self, value: u8) -> u8 {
        let scaled = u32::from(value) * u32::from(self.max_step()) / 255;
        // scaled <= max_step <= 255
        u8::try_from(scaled).unwrap_or(u8::MAX)
    }
}

impl TryFrom<u16> for BrightnessLevels {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            32 => Ok(Self::Levels32),
            64 => Ok(Self::Levels64),
            256 => Ok(Self::Levels256),
            other => Err(ValueError::InvalidBrightnessLevels(other)),
        }
    }
}

impl From<BrightnessLevels> for u16 {
    fn from(levels: BrightnessLevels) -> Self {
        levels.count()
    }
}

impl fmt::Display for BrightnessLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}
