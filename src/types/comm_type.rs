// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transmission medium for X10 commands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// How mochad should transmit a command.
///
/// # Examples
///
/// ```
/// use mochad_lib::types::CommType;
///
/// assert_eq!(CommType::default(), CommType::PowerLine);
/// assert_eq!("rf".parse::<CommType>().unwrap(), CommType::RadioFrequency);
/// assert_eq!(CommType::PowerLine.as_str(), "pl");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CommType {
    /// Power-line transmission (`pl`).
    #[default]
    PowerLine,
    /// Radio transmission (`rf`).
    RadioFrequency,
}

impl CommType {
    /// Returns the mochad command prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PowerLine => "pl",
            Self::RadioFrequency => "rf",
        }
    }
}

impl fmt::Display for CommType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pl" => Ok(Self::PowerLine),
            "rf" => Ok(Self::RadioFrequency),
            _ => Err(ValueError::InvalidCommType(s.to_string())),
        }
    }
}

impl TryFrom<String> for CommType {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommType> for String {
    fn from(comm: CommType) -> Self {
        comm.as_str().to_string()
    }
}
