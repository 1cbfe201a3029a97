// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the mochad daemon and the host's MQTT bus.
//!
//! mochad speaks a line-oriented text protocol over TCP (port 1099 by
//! default). Commands are written as `<comm> <address> <function>` lines and
//! the daemon echoes what it transmitted; there is no per-command response
//! that confirms the module actually changed state.
//!
//! # Components
//!
//! - [`Transport`]: a command connection that can send lines and drain echoes
//! - [`MochadConnection`]: the TCP implementation of [`Transport`]
//! - [`Dispatcher`]: the shared, lock-guarded connection used by every light
//! - [`Publish`]: callback receiving inbound X10 events for republishing
//! - [`MqttPublisher`]: [`Publish`] implementation backed by an MQTT broker

mod connection;
mod dispatcher;
#[cfg(feature = "mqtt")]
mod mqtt;
mod publish;
mod status;

pub use connection::MochadConnection;
pub use dispatcher::{DispatchGuard, Dispatcher, X10Device};
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttPublisher, MqttPublisherBuilder};
pub use publish::{Publication, Publish, Qos};
pub use status::parse_device_status;

use std::future::Future;

use crate::error::ProtocolError;

/// A command connection to the daemon.
///
/// Implementations only move text; serializing multi-step sequences is the
/// job of the [`Dispatcher`] that owns the transport.
pub trait Transport: Send {
    /// Writes one command line. The line terminator is added by the transport.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the line cannot be written.
    fn send_line(&mut self, line: &str)
    -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Reads whatever the daemon has sent since the last read.
    ///
    /// mochad echoes every transmitted command; these echoes must be drained
    /// or they pile up in the socket buffer.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the connection failed or was closed.
    fn read_data(&mut self) -> impl Future<Output = Result<String, ProtocolError>> + Send;
}
