// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host lifecycle events and inbound X10 traffic.
//!
//! Two kinds of events flow through this module:
//!
//! - [`HostEvent`]s announce that the host application finished starting or
//!   is about to stop. They are broadcast on a [`HostEventBus`] and drive the
//!   controller's receive loop.
//! - [`X10Event`]s are decoded from the daemon's `Rx` lines by an
//!   [`EventParser`] and forwarded to the host as publications.
//!
//! # Examples
//!
//! ```
//! use mochad_lib::event::{HostEvent, HostEventBus};
//!
//! let bus = HostEventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(HostEvent::Started);
//! assert_eq!(rx.try_recv().unwrap(), HostEvent::Started);
//! ```

mod event_bus;
mod host_event;
mod x10_event;

pub use event_bus::HostEventBus;
pub use host_event::HostEvent;
pub use x10_event::{EventParser, EventSource, X10Event};
