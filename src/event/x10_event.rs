// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of the daemon's received-traffic lines.
//!
//! mochad reports every X10 frame it sees on the wire as a text line:
//!
//! ```text
//! 05/21 21:07:46 Rx PL HouseUnit: A1
//! 05/21 21:07:46 Rx PL House: A Func: On
//! 05/21 21:08:02 Rx RF HouseUnit: B3 Func: Off
//! 05/21 21:09:11 Rx RFSEC Addr: 0x80 Func: Contact_alert_min_DS10A
//! ```
//!
//! Power-line traffic splits a command in two: one or more `HouseUnit:`
//! lines select units, and a `House: X Func: F` line applies a function to
//! every selected unit of that house. RF lines carry both parts at once.
//!
//! Only `Rx` lines produce events. mochad also echoes the commands it
//! transmits as `Tx` lines on the same stream; those are dropped, so lights
//! driven through this library do not show up as inbound traffic.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::protocol::Publication;
use crate::types::X10Address;

/// The radio or power-line channel an event was received on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// Power-line (CM15A).
    PowerLine,
    /// Standard RF remote or switch.
    Radio,
    /// RF security sensor.
    Security,
}

impl EventSource {
    /// Returns the topic segment for this source.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PowerLine => "pl",
            Self::Radio => "rf",
            Self::Security => "rfsec",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("pl") {
            Some(Self::PowerLine)
        } else if token.eq_ignore_ascii_case("rf") {
            Some(Self::Radio)
        } else if token.eq_ignore_ascii_case("rfsec") {
            Some(Self::Security)
        } else {
            None
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded X10 function received by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X10Event {
    /// Channel the frame arrived on.
    pub source: EventSource,
    /// Lowercase unit address (`"a1"`), house (`"a"`) for house-wide
    /// functions, or sensor address for security events.
    pub address: String,
    /// Lowercase function name with spaces replaced by `_` (`"all_units_off"`).
    pub func: String,
    /// When the line was decoded.
    pub received_at: DateTime<Utc>,
}

impl X10Event {
    /// Returns the topic this event is published on.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use mochad_lib::event::{EventSource, X10Event};
    ///
    /// let event = X10Event {
    ///     source: EventSource::PowerLine,
    ///     address: "a1".to_string(),
    ///     func: "on".to_string(),
    ///     received_at: Utc::now(),
    /// };
    /// assert_eq!(event.topic("x10"), "x10/pl/a1");
    /// ```
    #[must_use]
    pub fn topic(&self, prefix: &str) -> String {
        format!("{prefix}/{}/{}", self.source, self.address)
    }

    /// Builds the JSON payload `{"func": ..., "received_at": ...}`.
    #[must_use]
    pub fn payload(&self) -> String {
        json!({
            "func": self.func,
            "received_at": self.received_at.to_rfc3339(),
        })
        .to_string()
    }

    /// Converts the event into a non-retained QoS 0 publication.
    #[must_use]
    pub fn to_publication(&self, prefix: &str) -> Publication {
        Publication::new(self.topic(prefix), self.payload())
    }
}

#[derive(Debug, Default)]
struct Selection {
    units: Vec<u8>,
    // A function has been applied; the next HouseUnit starts a new selection
    closed: bool,
}

/// Fields of one received line, keyed by their `Key:` markers.
#[derive(Debug, Default)]
struct Fields<'a> {
    house_unit: Option<&'a str>,
    house: Option<&'a str>,
    addr: Option<&'a str>,
    func: Option<String>,
}

impl<'a> Fields<'a> {
    fn parse(tokens: &[&'a str]) -> Self {
        let mut fields = Self::default();
        let mut iter = tokens.iter().enumerate();

        while let Some((i, token)) = iter.next() {
            match *token {
                "HouseUnit:" => fields.house_unit = iter.next().map(|(_, t)| *t),
                "House:" => fields.house = iter.next().map(|(_, t)| *t),
                "Addr:" => fields.addr = iter.next().map(|(_, t)| *t),
                "Func:" => {
                    let func = tokens[i + 1..]
                        .iter()
                        .map(|t| t.to_ascii_lowercase())
                        .collect::<Vec<_>>()
                        .join("_");
                    if !func.is_empty() {
                        fields.func = Some(func);
                    }
                    break;
                }
                _ => {}
            }
        }

        fields
    }
}

/// Stateful decoder turning `Rx` lines into [`X10Event`]s.
///
/// Keeps the per-house unit selection needed to pair power-line `HouseUnit:`
/// lines with the `Func:` line that follows them. Transmit echoes (`Tx`) and
/// anything unrecognized are ignored.
///
/// # Examples
///
/// ```
/// use mochad_lib::event::EventParser;
///
/// let mut parser = EventParser::new();
/// assert!(parser.feed("05/21 21:07:46 Rx PL HouseUnit: A1").is_empty());
///
/// let events = parser.feed("05/21 21:07:46 Rx PL House: A Func: On");
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].address, "a1");
/// assert_eq!(events[0].func, "on");
/// ```
#[derive(Debug, Default)]
pub struct EventParser {
    selections: HashMap<char, Selection>,
}

impl EventParser {
    /// Creates a parser with no unit selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one line, timestamping events with the current time.
    pub fn feed(&mut self, line: &str) -> Vec<X10Event> {
        self.feed_at(line, Utc::now())
    }

    /// Decodes one line, timestamping events with `received_at`.
    pub fn feed_at(&mut self, line: &str, received_at: DateTime<Utc>) -> Vec<X10Event> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(rx) = tokens.iter().position(|t| *t == "Rx") else {
            tracing::trace!(line = %line, "Ignoring non-receive line");
            return Vec::new();
        };
        let Some(source) = tokens.get(rx + 1).and_then(|t| EventSource::from_token(t)) else {
            tracing::trace!(line = %line, "Ignoring line from unknown source");
            return Vec::new();
        };

        let fields = Fields::parse(&tokens[rx + 2..]);
        let events = match source {
            EventSource::PowerLine => self.power_line(&fields, received_at),
            EventSource::Radio => Self::radio(&fields, received_at),
            EventSource::Security => Self::security(&fields, received_at),
        };

        if events.is_empty() {
            tracing::trace!(line = %line, "Line produced no event");
        }
        events
    }

    fn power_line(&mut self, fields: &Fields<'_>, received_at: DateTime<Utc>) -> Vec<X10Event> {
        match (fields.house_unit, fields.house, &fields.func) {
            (Some(unit), _, None) => {
                if let Ok(address) = unit.parse::<X10Address>() {
                    self.select(address);
                }
                Vec::new()
            }
            (Some(unit), _, Some(func)) => unit
                .parse::<X10Address>()
                .map(|address| {
                    vec![event(EventSource::PowerLine, address.to_string(), func, received_at)]
                })
                .unwrap_or_default(),
            (None, Some(house), Some(func)) => match parse_house(house) {
                Some(house) => self.apply(house, func, received_at),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn radio(fields: &Fields<'_>, received_at: DateTime<Utc>) -> Vec<X10Event> {
        let Some(func) = &fields.func else {
            return Vec::new();
        };

        let address = if let Some(unit) = fields.house_unit {
            unit.parse::<X10Address>().ok().map(|a| a.to_string())
        } else {
            fields.house.and_then(parse_house).map(String::from)
        };

        address
            .map(|address| vec![event(EventSource::Radio, address, func, received_at)])
            .unwrap_or_default()
    }

    fn security(fields: &Fields<'_>, received_at: DateTime<Utc>) -> Vec<X10Event> {
        match (fields.addr, &fields.func) {
            (Some(addr), Some(func)) => vec![event(
                EventSource::Security,
                addr.to_ascii_lowercase(),
                func,
                received_at,
            )],
            _ => Vec::new(),
        }
    }

    fn select(&mut self, address: X10Address) {
        let selection = self.selections.entry(address.house()).or_default();
        if selection.closed {
            selection.units.clear();
            selection.closed = false;
        }
        if !selection.units.contains(&address.unit()) {
            selection.units.push(address.unit());
        }
    }

    fn apply(&mut self, house: char, func: &str, received_at: DateTime<Utc>) -> Vec<X10Event> {
        let selection = self.selections.entry(house).or_default();
        selection.closed = true;

        if selection.units.is_empty() {
            return vec![event(
                EventSource::PowerLine,
                house.to_string(),
                func,
                received_at,
            )];
        }

        selection
            .units
            .iter()
            .map(|unit| {
                event(
                    EventSource::PowerLine,
                    format!("{house}{unit}"),
                    func,
                    received_at,
                )
            })
            .collect()
    }
}

fn event(source: EventSource, address: String, func: &str, received_at: DateTime<Utc>) -> X10Event {
    X10Event {
        source,
        address,
        func: func.to_string(),
        received_at,
    }
}

fn parse_house(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if ('a'..='p').contains(&c.to_ascii_lowercase()) => {
            Some(c.to_ascii_lowercase())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 21, 21, 7, 46).unwrap()
    }

    fn feed(parser: &mut EventParser, line: &str) -> Vec<X10Event> {
        parser.feed_at(line, at())
    }

    fn addresses(events: &[X10Event]) -> Vec<&str> {
        events.iter().map(|e| e.address.as_str()).collect()
    }

    // ========================================================================
    // Power line
    // ========================================================================

    #[test]
    fn house_unit_then_func() {
        let mut parser = EventParser::new();
        assert!(feed(&mut parser, "05/21 21:07:46 Rx PL HouseUnit: A1").is_empty());

        let events = feed(&mut parser, "05/21 21:07:46 Rx PL House: A Func: On");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, EventSource::PowerLine);
        assert_eq!(events[0].address, "a1");
        assert_eq!(events[0].func, "on");
        assert_eq!(events[0].received_at, at());
    }

    #[test]
    fn multiple_units_share_one_func() {
        let mut parser = EventParser::new();
        feed(&mut parser, "Rx PL HouseUnit: B2");
        feed(&mut parser, "Rx PL HouseUnit: B5");
        feed(&mut parser, "Rx PL HouseUnit: B2");

        let events = feed(&mut parser, "Rx PL House: B Func: Off");
        assert_eq!(addresses(&events), vec!["b2", "b5"]);
    }

    #[test]
    fn selection_restarts_after_func() {
        let mut parser = EventParser::new();
        feed(&mut parser, "Rx PL HouseUnit: C1");
        feed(&mut parser, "Rx PL House: C Func: On");
        feed(&mut parser, "Rx PL HouseUnit: C3");

        let events = feed(&mut parser, "Rx PL House: C Func: Off");
        assert_eq!(addresses(&events), vec!["c3"]);
    }

    #[test]
    fn repeated_func_reuses_selection() {
        let mut parser = EventParser::new();
        feed(&mut parser, "Rx PL HouseUnit: D4");
        feed(&mut parser, "Rx PL House: D Func: Dim");

        let events = feed(&mut parser, "Rx PL House: D Func: Dim");
        assert_eq!(addresses(&events), vec!["d4"]);
    }

    #[test]
    fn houses_are_tracked_separately() {
        let mut parser = EventParser::new();
        feed(&mut parser, "Rx PL HouseUnit: A1");
        feed(&mut parser, "Rx PL HouseUnit: P16");

        let events = feed(&mut parser, "Rx PL House: P Func: On");
        assert_eq!(addresses(&events), vec!["p16"]);

        let events = feed(&mut parser, "Rx PL House: A Func: On");
        assert_eq!(addresses(&events), vec!["a1"]);
    }

    #[test]
    fn house_wide_func_without_selection() {
        let mut parser = EventParser::new();
        let events = feed(&mut parser, "05/21 21:10:00 Rx PL House: E Func: All units off");

        assert_eq!(addresses(&events), vec!["e"]);
        assert_eq!(events[0].func, "all_units_off");
    }

    // ========================================================================
    // RF
    // ========================================================================

    #[test]
    fn rf_line_carries_unit_and_func() {
        let mut parser = EventParser::new();
        let events = feed(&mut parser, "05/21 21:08:02 Rx RF HouseUnit: B3 Func: Off");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, EventSource::Radio);
        assert_eq!(events[0].address, "b3");
        assert_eq!(events[0].func, "off");
    }

    #[test]
    fn rf_house_func() {
        let mut parser = EventParser::new();
        let events = feed(&mut parser, "Rx RF House: F Func: Bright");
        assert_eq!(addresses(&events), vec!["f"]);
    }

    #[test]
    fn rf_security_uses_sensor_address() {
        let mut parser = EventParser::new();
        let events = feed(
            &mut parser,
            "05/21 21:09:11 Rx RFSEC Addr: 0xC6 Func: Contact_alert_min_DS10A",
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, EventSource::Security);
        assert_eq!(events[0].address, "0xc6");
        assert_eq!(events[0].func, "contact_alert_min_ds10a");
    }

    // ========================================================================
    // Ignored input
    // ========================================================================

    #[test]
    fn transmit_echo_is_ignored() {
        let mut parser = EventParser::new();
        assert!(feed(&mut parser, "05/21 21:07:46 Tx PL HouseUnit: A1").is_empty());
        assert!(feed(&mut parser, "05/21 21:07:46 Tx PL House: A Func: On").is_empty());
    }

    #[test]
    fn transmit_echo_does_not_select_units() {
        let mut parser = EventParser::new();
        assert!(feed(&mut parser, "05/21 21:07:46 Tx PL HouseUnit: A1").is_empty());

        let events = feed(&mut parser, "05/21 21:07:47 Rx PL House: A Func: Off");
        assert_eq!(addresses(&events), vec!["a"]);
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let mut parser = EventParser::new();
        assert!(feed(&mut parser, "").is_empty());
        assert!(feed(&mut parser, "Rx").is_empty());
        assert!(feed(&mut parser, "Rx XX HouseUnit: A1 Func: On").is_empty());
        assert!(feed(&mut parser, "Rx PL HouseUnit: Q1").is_empty());
        assert!(feed(&mut parser, "Rx PL House: Z Func: On").is_empty());
        assert!(feed(&mut parser, "Rx RF HouseUnit: A1 Func:").is_empty());
        assert!(feed(&mut parser, "Rx RFSEC Func: Arm").is_empty());
    }

    // ========================================================================
    // Publication
    // ========================================================================

    #[test]
    fn publication_topic_and_payload() {
        let mut parser = EventParser::new();
        let events = feed(&mut parser, "Rx RF HouseUnit: A1 Func: On");
        let publication = events[0].to_publication("home/x10");

        assert_eq!(publication.topic, "home/x10/rf/a1");
        assert!(!publication.retain);

        let payload: serde_json::Value =
            serde_json::from_slice(&publication.payload).unwrap();
        assert_eq!(payload["func"], "on");
        assert_eq!(payload["received_at"], "2024-05-21T21:07:46+00:00");
    }
}
