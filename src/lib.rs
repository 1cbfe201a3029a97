// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `mochad_lib` - A Rust library to drive X10 dimmers through mochad.
//!
//! [mochad](https://sourceforge.net/projects/mochad/) is a Linux daemon that
//! exposes CM15A and CM19A X10 controllers over a line-oriented TCP
//! interface. This library connects to it, exposes X10 dimmers as light
//! entities with an assumed on/off/brightness state, and forwards the X10
//! traffic mochad receives to a pub/sub bus such as MQTT.
//!
//! # Supported Features
//!
//! - **Light control**: on, off and brightness for 32-level classic dimmers
//!   and 64/256-level extended modules
//! - **Serialized access**: all lights of a controller share one command
//!   connection; each command sequence runs under a single lock
//! - **Inbound events**: power-line, RF and RF security frames decoded and
//!   published as `<prefix>/<source>/<address>` topics
//! - **Host lifecycle**: receiving starts and stops with host events
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mochad_lib::config::IntegrationConfig;
//! use mochad_lib::event::{HostEvent, HostEventBus};
//! use mochad_lib::integration;
//! use mochad_lib::protocol::MqttPublisher;
//!
//! #[tokio::main]
//! async fn main() -> mochad_lib::Result<()> {
//!     let config = IntegrationConfig::from_json(
//!         r#"{"mochad": {"host": "localhost"}, "devices": [{"address": "a1"}]}"#,
//!     )?;
//!     let publisher = Arc::new(MqttPublisher::connect("mqtt://localhost:1883").await?);
//!
//!     let bus = HostEventBus::new();
//!     let controller = integration::setup(&config, publisher, &bus)?;
//!     bus.publish(HostEvent::Started);
//!
//!     let mut lights = integration::setup_platform(&controller, &config.devices).await;
//!     lights[0].turn_on(Some(128)).await;
//!     lights[0].turn_off().await;
//!
//!     bus.publish(HostEvent::Stopping);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `mqtt` (default): [`protocol::MqttPublisher`], forwarding inbound X10
//!   events to an MQTT broker

mod capabilities;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod integration;
pub mod light;
pub mod protocol;
pub mod state;
pub mod types;

pub use capabilities::LightFeatures;
pub use command::X10Command;
pub use config::{IntegrationConfig, LightConfig, MochadConfig};
pub use controller::{LinkStatus, MochadController};
pub use error::{ConfigurationError, Error, ProtocolError, Result, ValueError};
pub use light::MochadLight;
pub use state::LightState;
pub use types::{BrightnessLevels, CommType, X10Address};
