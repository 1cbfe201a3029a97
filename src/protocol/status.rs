// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for mochad's `st` status dump.
//!
//! The dump looks like this (timestamps elided):
//!
//! ```text
//! Device selected
//! House A: 1
//! Device status
//! House A: 1=1,2=0,3=1
//! Security sensor status
//! End status
//! ```
//!
//! Only the `Device status` section carries on/off values; `Device selected`
//! lists units without values and is skipped.

use crate::types::X10Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    DeviceStatus,
}

/// Looks up a unit's on/off state in a status dump.
///
/// Returns `None` if the unit does not appear in the `Device status` section.
///
/// # Examples
///
/// ```
/// use mochad_lib::protocol::parse_device_status;
///
/// let dump = "02/13 22:33:09 Device status\n\
///             02/13 22:33:09 House A: 1=1,2=0\n\
///             02/13 22:33:09 End status\n";
///
/// assert_eq!(parse_device_status(dump, "a1".parse().unwrap()), Some(true));
/// assert_eq!(parse_device_status(dump, "a2".parse().unwrap()), Some(false));
/// assert_eq!(parse_device_status(dump, "b1".parse().unwrap()), None);
/// ```
#[must_use]
pub fn parse_device_status(dump: &str, address: X10Address) -> Option<bool> {
    let mut section = Section::Other;

    for line in dump.lines() {
        if line.ends_with("Device status") {
            section = Section::DeviceStatus;
            continue;
        }
        if line.ends_with("status") || line.ends_with("Device selected") {
            section = Section::Other;
            continue;
        }
        if section != Section::DeviceStatus {
            continue;
        }

        let Some((_, rest)) = line.split_once("House ") else {
            continue;
        };
        let Some((house, units)) = rest.split_once(':') else {
            continue;
        };
        if !house.trim().eq_ignore_ascii_case(&address.house().to_string()) {
            continue;
        }

        for pair in units.split(',') {
            let Some((unit, value)) = pair.split_once('=') else {
                continue;
            };
            if unit.trim().parse::<u8>().ok() == Some(address.unit()) {
                return Some(value.trim() == "1");
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
02/13 22:33:09 Device selected
02/13 22:33:09 House A: 1,3
02/13 22:33:09 House P: 16
02/13 22:33:09 Device status
02/13 22:33:09 House A: 1=1,2=0,3=1
02/13 22:33:09 House P: 16=0
02/13 22:33:09 Security sensor status
02/13 22:33:09 End status
";

    fn addr(s: &str) -> X10Address {
        s.parse().unwrap()
    }

    #[test]
    fn finds_on_and_off_units() {
        assert_eq!(parse_device_status(DUMP, addr("a1")), Some(true));
        assert_eq!(parse_device_status(DUMP, addr("a2")), Some(false));
        assert_eq!(parse_device_status(DUMP, addr("A3")), Some(true));
        assert_eq!(parse_device_status(DUMP, addr("p16")), Some(false));
    }

    #[test]
    fn unknown_units_are_absent() {
        assert_eq!(parse_device_status(DUMP, addr("a4")), None);
        assert_eq!(parse_device_status(DUMP, addr("c1")), None);
    }

    #[test]
    fn selected_section_is_ignored() {
        let dump = "01/01 00:00:00 Device selected\n01/01 00:00:00 House B: 5\n";
        assert_eq!(parse_device_status(dump, addr("b5")), None);
    }

    #[test]
    fn empty_dump() {
        assert_eq!(parse_device_status("", addr("a1")), None);
    }
}
