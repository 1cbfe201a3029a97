// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared, serialized access to the daemon's command connection.
//!
//! Every light of a controller sends through one connection. A light's
//! command sequence (`on`, flush, `dim n`, flush) must not interleave with
//! another light's sequence, or the daemon's echoes end up drained by the
//! wrong caller. The [`Dispatcher`] therefore hands out a [`DispatchGuard`]
//! that is held for a whole sequence, not for a single send.

use std::fmt;

use tokio::sync::{Mutex, MutexGuard};

use super::Transport;
use super::status::parse_device_status;
use crate::error::ProtocolError;
use crate::types::{CommType, X10Address};

/// Maximum number of reads spent collecting one status dump.
const STATUS_READ_ATTEMPTS: usize = 8;

/// Marker line closing mochad's status dump.
const STATUS_END: &str = "End status";

/// Owner of the (possibly absent) command connection.
///
/// The connection is attached once the controller has connected to the
/// daemon and detached when it disconnects. While detached, sends are no-ops
/// and status queries report "off".
///
/// # Examples
///
/// ```no_run
/// use mochad_lib::protocol::{Dispatcher, MochadConnection};
/// use mochad_lib::types::{CommType, X10Address};
///
/// # async fn example() -> mochad_lib::Result<()> {
/// let dispatcher = Dispatcher::new();
/// dispatcher.attach(MochadConnection::connect("localhost", 1099).await?).await;
///
/// let address: X10Address = "a1".parse()?;
/// let mut link = dispatcher.lock().await;
/// if let Some(mut device) = link.device(address, CommType::PowerLine) {
///     device.send_cmd("on").await?;
/// }
/// link.read_data().await;
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<T> {
    link: Mutex<Option<T>>,
}

impl<T: Transport> Dispatcher<T> {
    /// Creates a dispatcher with no connection attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            link: Mutex::new(None),
        }
    }

    /// Creates a dispatcher around an already open connection.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            link: Mutex::new(Some(transport)),
        }
    }

    /// Installs a connection, returning the one it replaces.
    ///
    /// Waits for any in-flight command sequence to finish first.
    pub async fn attach(&self, transport: T) -> Option<T> {
        self.link.lock().await.replace(transport)
    }

    /// Removes the connection; subsequent sends become no-ops.
    pub async fn detach(&self) -> Option<T> {
        self.link.lock().await.take()
    }

    /// Returns `true` if a connection is attached.
    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.is_some()
    }

    /// Acquires exclusive use of the connection for a command sequence.
    ///
    /// The lock is fair in acquisition order but callers must not rely on
    /// which waiter is served next.
    pub async fn lock(&self) -> DispatchGuard<'_, T> {
        DispatchGuard {
            link: self.link.lock().await,
        }
    }
}

impl<T: Transport> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Exclusive access to the command connection, held for one sequence.
pub struct DispatchGuard<'a, T> {
    link: MutexGuard<'a, Option<T>>,
}

impl<T: Transport> DispatchGuard<'_, T> {
    /// Returns `true` if a connection is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Returns a handle addressing one device, or `None` without a connection.
    pub fn device(&mut self, address: X10Address, comm_type: CommType) -> Option<X10Device<'_, T>> {
        self.link.as_mut().map(|transport| X10Device {
            transport,
            address,
            comm_type,
        })
    }

    /// Drains the daemon's echo of previously sent commands.
    ///
    /// Best-effort: returns `None` if no connection is attached or the read
    /// failed. Failures are logged, never propagated.
    pub async fn read_data(&mut self) -> Option<String> {
        let transport = self.link.as_mut()?;
        match transport.read_data().await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to drain mochad output");
                None
            }
        }
    }
}

impl<T> fmt::Debug for DispatchGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchGuard")
            .field("connected", &self.link.is_some())
            .finish()
    }
}

/// A device handle bound to (connection, address, comm type).
///
/// Handles are created per call from a [`DispatchGuard`] and cannot outlive
/// it, so every use of the connection happens under the dispatch lock.
pub struct X10Device<'a, T> {
    transport: &'a mut T,
    address: X10Address,
    comm_type: CommType,
}

impl<T: Transport> X10Device<'_, T> {
    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> X10Address {
        self.address
    }

    /// Returns the comm type used for this device.
    #[must_use]
    pub fn comm_type(&self) -> CommType {
        self.comm_type
    }

    /// Formats the full mochad line for a command.
    #[must_use]
    pub fn command_line(&self, cmd: &str) -> String {
        format!("{} {} {cmd}", self.comm_type, self.address)
    }

    /// Sends a command to this device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the line cannot be written.
    pub async fn send_cmd(&mut self, cmd: &str) -> Result<(), ProtocolError> {
        let line = self.command_line(cmd);
        self.transport.send_line(&line).await
    }

    /// Queries the daemon's status table for this device.
    ///
    /// Returns `true` if mochad last saw the unit switched on. Units absent
    /// from the table are reported off.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the query cannot be sent or read.
    pub async fn get_status(&mut self) -> Result<bool, ProtocolError> {
        self.transport.send_line("st").await?;

        let mut dump = String::new();
        for _ in 0..STATUS_READ_ATTEMPTS {
            let chunk = self.transport.read_data().await?;
            if chunk.is_empty() {
                break;
            }
            dump.push_str(&chunk);
            if dump.contains(STATUS_END) {
                break;
            }
        }

        Ok(parse_device_status(&dump, self.address).unwrap_or(false))
    }
}

impl<T> fmt::Debug for X10Device<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X10Device")
            .field("address", &self.address)
            .field("comm_type", &self.comm_type)
            .finish_non_exhaustive()
    }
}
