// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP command connection to mochad.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use crate::error::ProtocolError;

/// Size of a single socket read while draining.
const READ_CHUNK: usize = 1024;

/// Command connection to a mochad daemon.
///
/// # Examples
///
/// ```no_run
/// use mochad_lib::protocol::{MochadConnection, Transport};
///
/// # async fn example() -> mochad_lib::Result<()> {
/// let mut conn = MochadConnection::connect("localhost", 1099).await?;
/// conn.send_line("pl a1 on").await?;
/// let echo = conn.read_data().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MochadConnection {
    stream: TcpStream,
    peer: String,
    read_window: Duration,
}

impl MochadConnection {
    /// How long `read_data` waits for more bytes before returning.
    pub const DEFAULT_READ_WINDOW: Duration = Duration::from_millis(250);

    /// Opens a command connection to the daemon.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ConnectionFailed` if the daemon is unreachable.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ProtocolError> {
        let peer = format!("{host}:{port}");
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| ProtocolError::ConnectionFailed(format!("{peer}: {e}")))?;
        stream.set_nodelay(true)?;

        tracing::debug!(peer = %peer, "Opened mochad command connection");

        Ok(Self {
            stream,
            peer,
            read_window: Self::DEFAULT_READ_WINDOW,
        })
    }

    /// Sets how long `read_data` waits for the daemon's echo.
    #[must_use]
    pub fn with_read_window(mut self, window: Duration) -> Self {
        self.read_window = window;
        self
    }

    /// Returns the `host:port` this connection was opened to.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl Transport for MochadConnection {
    async fn send_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        tracing::debug!(peer = %self.peer, line = %line, "Sending mochad command");
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.stream.write_all(buf.as_bytes()).await?;
        Ok(())
    }

    async fn read_data(&mut self) -> Result<String, ProtocolError> {
        let mut data = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        // Keep reading until the daemon goes quiet for a whole window
        loop {
            match tokio::time::timeout(self.read_window, self.stream.read(&mut chunk)).await {
                Ok(Ok(0)) => {
                    if data.is_empty() {
                        return Err(ProtocolError::ConnectionClosed);
                    }
                    break;
                }
                Ok(Ok(n)) => data.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(ProtocolError::Io(e)),
                Err(_) => break,
            }
        }

        let text = String::from_utf8_lossy(&data).into_owned();
        tracing::trace!(peer = %self.peer, data = %text, "Drained mochad output");
        Ok(text)
    }
}
