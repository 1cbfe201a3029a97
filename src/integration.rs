// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wiring the controller and its lights into a host application.
//!
//! A host sets the integration up in two steps:
//!
//! 1. [`setup`] validates the configuration, creates the controller and binds
//!    it to the host's lifecycle events.
//! 2. [`setup_platform`] waits for the host's start event and the connection
//!    attempt it triggers, then creates one [`MochadLight`] per configured
//!    device.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use mochad_lib::config::IntegrationConfig;
//! use mochad_lib::event::{HostEvent, HostEventBus};
//! use mochad_lib::integration;
//! use mochad_lib::protocol::Publication;
//!
//! # async fn example() -> mochad_lib::Result<()> {
//! let config = IntegrationConfig::from_file("mochad.json")?;
//! let bus = HostEventBus::new();
//!
//! let controller = integration::setup(
//!     &config,
//!     Arc::new(|p: &Publication| println!("{}", p.topic)),
//!     &bus,
//! )?;
//! bus.publish(HostEvent::Started);
//!
//! let mut lights = integration::setup_platform(&controller, &config.devices).await;
//! lights[0].turn_on(Some(200)).await;
//!
//! bus.publish(HostEvent::Stopping);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::{IntegrationConfig, LightConfig};
use crate::controller::MochadController;
use crate::error::Error;
use crate::event::HostEventBus;
use crate::light::MochadLight;
use crate::protocol::Publish;

/// Creates the controller and binds it to host lifecycle events.
///
/// Receiving starts on the bus's next [`HostEvent::Started`](crate::event::HostEvent::Started)
/// and stops on the following `Stopping` event.
///
/// # Errors
///
/// Returns `Error::Configuration` if the daemon settings are invalid. The
/// error is also logged; the host should treat the integration as
/// unavailable.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn setup(
    config: &IntegrationConfig,
    publisher: Arc<dyn Publish>,
    bus: &HostEventBus,
) -> Result<Arc<MochadController>, Error> {
    let controller = match MochadController::new(config.mochad.clone(), publisher) {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up mochad integration");
            return Err(e);
        }
    };

    // Runs until the host stops; nothing needs to join it
    let _lifecycle = controller.listen_lifecycle(bus);

    tracing::debug!(
        host = %controller.host(),
        port = controller.port(),
        devices = config.devices.len(),
        "Set up mochad integration"
    );
    Ok(controller)
}

/// Creates one light per device, sharing the controller's dispatcher.
///
/// Waits for any pending or in-flight connection attempt to settle first.
/// When the controller was bound by [`setup`], that includes waiting for the
/// host's start event. Lights are created even if the connection failed;
/// their commands are then dropped.
pub async fn setup_platform(
    controller: &MochadController,
    devices: &[LightConfig],
) -> Vec<MochadLight> {
    let status = controller.wait_until_ready().await;
    tracing::debug!(status = ?status, count = devices.len(), "Creating mochad lights");

    devices
        .iter()
        .map(|device| MochadLight::new(controller.dispatcher(), device))
        .collect()
}
