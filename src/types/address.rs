// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! X10 device addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// An X10 address: a house code (A-P) and a unit number (1-16).
///
/// Parsing is case-insensitive; the canonical form is lowercase, which is
/// what mochad expects on the wire and what entity names are built from.
///
/// # Examples
///
/// ```
/// use mochad_lib::types::X10Address;
///
/// let addr: X10Address = "B12".parse().unwrap();
/// assert_eq!(addr.house(), 'b');
/// assert_eq!(addr.unit(), 12);
/// assert_eq!(addr.to_string(), "b12");
///
/// assert!("Q1".parse::<X10Address>().is_err());
/// assert!("A17".parse::<X10Address>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct X10Address {
    house: char,
    unit: u8,
}

impl X10Address {
    /// Creates an address from a house letter and unit number.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidAddress` if the house is not A-P or the
    /// unit is not 1-16.
    pub fn new(house: char, unit: u8) -> Result<Self, ValueError> {
        let house = house.to_ascii_lowercase();
        if !('a'..='p').contains(&house) || !(1..=16).contains(&unit) {
            return Err(ValueError::InvalidAddress(format!("{house}{unit}")));
        }
        Ok(Self { house, unit })
    }

    /// Returns the lowercase house letter.
    #[must_use]
    pub const fn house(&self) -> char {
        self.house
    }

    /// Returns the unit number (1-16).
    #[must_use]
    pub const fn unit(&self) -> u8 {
        self.unit
    }
}

impl FromStr for X10Address {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidAddress(s.to_string());

        let mut chars = s.chars();
        let house = chars.next().ok_or_else(invalid)?;
        let unit = chars.as_str();

        // Leading zeros and signs are not valid unit spellings
        if unit.is_empty() || unit.starts_with('0') || !unit.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let unit: u8 = unit.parse().map_err(|_| invalid())?;

        Self::new(house, unit).map_err(|_| invalid())
    }
}

impl TryFrom<String> for X10Address {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<X10Address> for String {
    fn from(addr: X10Address) -> Self {
        addr.to_string()
    }
}

impl fmt::Display for X10Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.house, self.unit)
    }
}
