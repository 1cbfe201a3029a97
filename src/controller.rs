// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller owning the connection to the mochad daemon.
//!
//! The controller holds two connections once receiving has started:
//!
//! - an *event stream* on which mochad reports every X10 frame it sees; the
//!   receive loop decodes these lines and hands them to a [`Publish`]er;
//! - a *command connection* attached to the shared [`Dispatcher`] that every
//!   light sends through.
//!
//! Both are opened by the receive loop and closed when it stops.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::MochadConfig;
use crate::error::{Error, ProtocolError};
use crate::event::{EventParser, HostEvent, HostEventBus};
use crate::protocol::{Dispatcher, MochadConnection, Publish};

/// State of the controller's link to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Receiving has not been started.
    Idle,
    /// Receiving starts on the host's next start event.
    Armed,
    /// The receive loop is connecting.
    Connecting,
    /// Both connections are open.
    Connected,
    /// The connection attempt failed. It is not retried.
    Failed,
    /// The connection was closed by a stop request or by the daemon.
    Closed,
}

impl LinkStatus {
    /// Returns `false` while a connection attempt is pending or in flight.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Armed | Self::Connecting)
    }
}

/// Lifecycle of the receive loop. Moves forward only.
enum ReceiverSlot {
    Idle,
    Running {
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<()>,
    },
    Stopped,
}

/// Everything the receive loop needs, detached from the controller.
struct ReceiveContext {
    host: String,
    port: u16,
    topic_prefix: String,
    dispatcher: Arc<Dispatcher<MochadConnection>>,
    publisher: Arc<dyn Publish>,
    link: Arc<watch::Sender<LinkStatus>>,
}

/// Send/receive controller for one mochad daemon.
///
/// Construction validates the configuration but does not connect. Call
/// [`start_x10_receiving`](Self::start_x10_receiving) (or hook the controller
/// to host lifecycle events with [`listen_lifecycle`](Self::listen_lifecycle))
/// to open the connections.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use mochad_lib::config::MochadConfig;
/// use mochad_lib::controller::MochadController;
/// use mochad_lib::protocol::Publication;
///
/// # async fn example() -> mochad_lib::Result<()> {
/// let controller = MochadController::new(
///     MochadConfig::default(),
///     Arc::new(|p: &Publication| println!("{}", p.topic)),
/// )?;
///
/// controller.start_x10_receiving();
/// controller.wait_until_ready().await;
/// // ... create lights from controller.dispatcher() ...
/// controller.stop_x10_receiving().await;
/// # Ok(())
/// # }
/// ```
pub struct MochadController {
    config: MochadConfig,
    dispatcher: Arc<Dispatcher<MochadConnection>>,
    publisher: Arc<dyn Publish>,
    receiver: parking_lot::Mutex<ReceiverSlot>,
    link: Arc<watch::Sender<LinkStatus>>,
}

impl MochadController {
    /// Creates a controller for the configured daemon.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the host, port or topic prefix is
    /// invalid.
    pub fn new(config: MochadConfig, publisher: Arc<dyn Publish>) -> Result<Self, Error> {
        config.validate()?;

        let (link, _) = watch::channel(LinkStatus::Idle);
        Ok(Self {
            config,
            dispatcher: Arc::new(Dispatcher::new()),
            publisher,
            receiver: parking_lot::Mutex::new(ReceiverSlot::Idle),
            link: Arc::new(link),
        })
    }

    /// Returns the host mochad runs on.
    #[must_use]
    pub fn host(&self) -> &str {
        self.config.host()
    }

    /// Returns the port mochad listens on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.config.port()
    }

    /// Returns the controller's configuration.
    #[must_use]
    pub fn config(&self) -> &MochadConfig {
        &self.config
    }

    /// Returns the dispatcher lights send their commands through.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<Dispatcher<MochadConnection>> {
        Arc::clone(&self.dispatcher)
    }

    /// Returns the current link status.
    #[must_use]
    pub fn link_status(&self) -> LinkStatus {
        *self.link.borrow()
    }

    /// Waits until no connection attempt is pending or in flight and returns
    /// the status.
    ///
    /// Returns immediately if receiving was never started and is not bound to
    /// host lifecycle events. Once bound, waits for the start event and the
    /// connection attempt that follows it.
    pub async fn wait_until_ready(&self) -> LinkStatus {
        let mut rx = self.link.subscribe();
        match rx.wait_for(LinkStatus::is_settled).await {
            Ok(status) => *status,
            Err(_) => self.link_status(),
        }
    }

    /// Starts the receive loop.
    ///
    /// The loop runs at most once per controller: calling this while it is
    /// running, or after it was stopped, logs a warning and does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_x10_receiving(&self) {
        let mut slot = self.receiver.lock();
        match *slot {
            ReceiverSlot::Idle => {}
            ReceiverSlot::Running { .. } => {
                tracing::warn!(peer = %self.peer(), "X10 receiving already started");
                return;
            }
            ReceiverSlot::Stopped => {
                tracing::warn!(peer = %self.peer(), "X10 receiving was stopped, not restarting");
                return;
            }
        }

        self.link.send_replace(LinkStatus::Connecting);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let context = ReceiveContext {
            host: self.config.host().to_string(),
            port: self.config.port(),
            topic_prefix: self.config.topic_prefix().to_string(),
            dispatcher: Arc::clone(&self.dispatcher),
            publisher: Arc::clone(&self.publisher),
            link: Arc::clone(&self.link),
        };
        let task = tokio::spawn(receive_loop(context, shutdown_rx));

        *slot = ReceiverSlot::Running { shutdown, task };
        tracing::debug!(peer = %self.peer(), "Started X10 receiving");
    }

    /// Stops the receive loop and closes both connections.
    ///
    /// Waits for the loop to finish. Does nothing unless the loop is running.
    pub async fn stop_x10_receiving(&self) {
        let running = {
            let mut slot = self.receiver.lock();
            match std::mem::replace(&mut *slot, ReceiverSlot::Stopped) {
                ReceiverSlot::Running { shutdown, task } => Some((shutdown, task)),
                other => {
                    *slot = other;
                    None
                }
            }
        };

        let Some((shutdown, task)) = running else {
            tracing::debug!(peer = %self.peer(), "X10 receiving not running, nothing to stop");
            return;
        };

        if shutdown.send(()).is_err() {
            tracing::trace!(peer = %self.peer(), "X10 receive loop already exited");
        }
        if let Err(e) = task.await {
            tracing::error!(error = %e, "X10 receive loop terminated abnormally");
        }
    }

    /// Binds the receive loop to host lifecycle events.
    ///
    /// Starts receiving on the first [`HostEvent::Started`], then stops on the
    /// next [`HostEvent::Stopping`] and exits. A stop event that arrives
    /// before any start event is ignored.
    ///
    /// Until the start event arrives the link reports [`LinkStatus::Armed`],
    /// so [`wait_until_ready`](Self::wait_until_ready) waits for the
    /// connection. If the bus closes first, the link falls back to
    /// [`LinkStatus::Idle`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn listen_lifecycle(self: &Arc<Self>, bus: &HostEventBus) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut events = bus.subscribe();
        self.link
            .send_if_modified(|status| replace_if(status, LinkStatus::Idle, LinkStatus::Armed));

        tokio::spawn(async move {
            let mut started = false;
            loop {
                match events.recv().await {
                    Ok(HostEvent::Started) if !started => {
                        started = true;
                        controller.start_x10_receiving();
                    }
                    Ok(HostEvent::Stopping) if started => {
                        controller.stop_x10_receiving().await;
                        break;
                    }
                    Ok(event) => {
                        tracing::trace!(event = %event, "Ignoring host event");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed host events");
                    }
                    Err(RecvError::Closed) => {
                        if !started {
                            controller.link.send_if_modified(|status| {
                                replace_if(status, LinkStatus::Armed, LinkStatus::Idle)
                            });
                        }
                        break;
                    }
                }
            }
        })
    }

    fn peer(&self) -> String {
        format!("{}:{}", self.config.host(), self.config.port())
    }
}

impl fmt::Debug for MochadController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MochadController")
            .field("host", &self.config.host())
            .field("port", &self.config.port())
            .field("link", &self.link_status())
            .finish_non_exhaustive()
    }
}

fn replace_if(status: &mut LinkStatus, from: LinkStatus, to: LinkStatus) -> bool {
    if *status == from {
        *status = to;
        true
    } else {
        false
    }
}

/// Opens both connections, then forwards inbound X10 events until shutdown.
async fn receive_loop(context: ReceiveContext, mut shutdown: oneshot::Receiver<()>) {
    let ReceiveContext {
        host,
        port,
        topic_prefix,
        dispatcher,
        publisher,
        link,
    } = context;
    let peer = format!("{host}:{port}");

    let connect = async {
        let events = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| ProtocolError::ConnectionFailed(format!("{peer}: {e}")))?;
        let commands = MochadConnection::connect(&host, port).await?;
        Ok::<_, ProtocolError>((events, commands))
    };

    let (events, commands) = tokio::select! {
        result = connect => match result {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(peer = %peer, error = %e, "Failed to connect to mochad");
                link.send_replace(LinkStatus::Failed);
                return;
            }
        },
        _ = &mut shutdown => {
            link.send_replace(LinkStatus::Closed);
            return;
        }
    };

    dispatcher.attach(commands).await;
    link.send_replace(LinkStatus::Connected);
    tracing::info!(peer = %peer, "Connected to mochad");

    let mut lines = BufReader::new(events).lines();
    let mut parser = EventParser::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    for event in parser.feed(&line) {
                        let publication = event.to_publication(&topic_prefix);
                        tracing::debug!(
                            topic = %publication.topic,
                            func = %event.func,
                            "Forwarding X10 event"
                        );
                        publisher.publish(&publication);
                    }
                }
                Ok(None) => {
                    tracing::warn!(peer = %peer, "mochad closed the event stream");
                    break;
                }
                Err(e) => {
                    tracing::warn!(peer = %peer, error = %e, "Failed to read from mochad");
                    break;
                }
            }
        }
    }

    dispatcher.detach().await;
    link.send_replace(LinkStatus::Closed);
    tracing::info!(peer = %peer, "Disconnected from mochad");
}
