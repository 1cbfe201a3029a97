// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature flags advertised by light entities.

use std::fmt;
use std::ops::BitOr;

/// Set of optional features a light supports.
///
/// X10 dimmers support brightness only; the flag values match the host's
/// light feature bitmask.
///
/// # Examples
///
/// ```
/// use mochad_lib::LightFeatures;
///
/// let features = LightFeatures::BRIGHTNESS;
/// assert!(features.contains(LightFeatures::BRIGHTNESS));
/// assert!(!LightFeatures::empty().contains(LightFeatures::BRIGHTNESS));
/// assert_eq!(features.bits(), 1);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LightFeatures(u32);

impl LightFeatures {
    /// Brightness can be set.
    pub const BRIGHTNESS: Self = Self(1);

    /// Returns a set with no features.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns the raw bitmask.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if every feature of `other` is in this set.
    #[must_use]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the set holds no feature.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LightFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for LightFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.contains(Self::BRIGHTNESS) {
            set.entry(&"BRIGHTNESS");
        }
        set.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set() {
        let features = LightFeatures::default();
        assert!(features.is_empty());
        assert_eq!(features, LightFeatures::empty());
        assert_eq!(format!("{features:?}"), "{}");
    }

    #[test]
    fn union_contains_members() {
        let features = LightFeatures::empty() | LightFeatures::BRIGHTNESS;
        assert!(features.contains(LightFeatures::BRIGHTNESS));
        assert!(features.contains(LightFeatures::empty()));
        assert_eq!(format!("{features:?}"), "{\"BRIGHTNESS\"}");
    }
}
