// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration configuration.
//!
//! The configuration is a JSON document with a `mochad` section describing
//! the daemon and a `devices` list with one entry per dimmer:
//!
//! ```json
//! {
//!   "mochad": { "host": "localhost", "port": 1099, "topic_prefix": "x10" },
//!   "devices": [
//!     { "address": "a1" },
//!     { "name": "Porch", "address": "b3", "comm_type": "rf", "brightness_levels": 64 }
//!   ]
//! }
//! ```
//!
//! Every field except a device's `address` is optional. Addresses, comm types
//! and brightness levels are validated while deserializing, so a document
//! that loads successfully only holds well-formed devices.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::types::{BrightnessLevels, CommType, X10Address};

/// Default mochad host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default mochad port.
pub const DEFAULT_PORT: u16 = 1099;

/// Default prefix of inbound event topics.
pub const DEFAULT_TOPIC_PREFIX: &str = "x10";

/// Longest accepted host name, per RFC 1035.
const MAX_HOST_LEN: usize = 253;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.to_string()
}

/// Connection settings for the mochad daemon.
///
/// # Examples
///
/// ```
/// use mochad_lib::config::MochadConfig;
///
/// let config = MochadConfig::default()
///     .with_host("192.168.1.10")
///     .with_port(1100);
///
/// assert_eq!(config.host(), "192.168.1.10");
/// assert_eq!(config.port(), 1100);
/// assert_eq!(config.topic_prefix(), "x10");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MochadConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_topic_prefix")]
    topic_prefix: String,
}

impl MochadConfig {
    /// Creates a configuration for the given daemon address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            topic_prefix: default_topic_prefix(),
        }
    }

    /// Sets the daemon host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the daemon port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the prefix of inbound event topics.
    #[must_use]
    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Returns the daemon host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the daemon port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the prefix of inbound event topics.
    #[must_use]
    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the host is empty, too long or holds
    /// whitespace, control characters or `/`; if the port is zero; or if the
    /// topic prefix is empty or contains an MQTT wildcard.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let host = &self.host;
        if host.is_empty()
            || host.len() > MAX_HOST_LEN
            || host
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || c == '/')
        {
            return Err(ConfigurationError::InvalidHost(host.clone()));
        }

        if self.port == 0 {
            return Err(ConfigurationError::InvalidPort(self.port));
        }

        let prefix = &self.topic_prefix;
        if prefix.is_empty() || prefix.contains(['+', '#']) {
            return Err(ConfigurationError::InvalidTopicPrefix(prefix.clone()));
        }

        Ok(())
    }
}

impl Default for MochadConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// One X10 dimmer to expose as a light.
///
/// # Examples
///
/// ```
/// use mochad_lib::config::LightConfig;
/// use mochad_lib::types::{BrightnessLevels, CommType};
///
/// let light = LightConfig::new("a1".parse().unwrap());
/// assert_eq!(light.entity_name(), "x10_light_dev_a1");
/// assert_eq!(light.comm_type(), CommType::PowerLine);
/// assert_eq!(light.brightness_levels(), BrightnessLevels::Levels32);
///
/// let named = LightConfig::new("b3".parse().unwrap())
///     .with_name("Porch")
///     .with_brightness_levels(BrightnessLevels::Levels64);
/// assert_eq!(named.entity_name(), "Porch");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    address: X10Address,
    #[serde(default)]
    comm_type: CommType,
    #[serde(default)]
    brightness_levels: BrightnessLevels,
}

impl LightConfig {
    /// Creates a configuration with default comm type and brightness levels.
    #[must_use]
    pub fn new(address: X10Address) -> Self {
        Self {
            name: None,
            address,
            comm_type: CommType::default(),
            brightness_levels: BrightnessLevels::default(),
        }
    }

    /// Sets a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the communication type.
    #[must_use]
    pub fn with_comm_type(mut self, comm_type: CommType) -> Self {
        self.comm_type = comm_type;
        self
    }

    /// Sets the number of brightness levels.
    #[must_use]
    pub fn with_brightness_levels(mut self, levels: BrightnessLevels) -> Self {
        self.brightness_levels = levels;
        self
    }

    /// Returns the configured name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> X10Address {
        self.address
    }

    /// Returns the communication type.
    #[must_use]
    pub fn comm_type(&self) -> CommType {
        self.comm_type
    }

    /// Returns the number of brightness levels.
    #[must_use]
    pub fn brightness_levels(&self) -> BrightnessLevels {
        self.brightness_levels
    }

    /// Returns the configured name, or `x10_light_dev_<address>` without one.
    #[must_use]
    pub fn entity_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("x10_light_dev_{}", self.address))
    }
}

/// The whole integration: daemon settings plus the lights to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Daemon connection settings.
    #[serde(default)]
    pub mochad: MochadConfig,
    /// Dimmers exposed as lights.
    #[serde(default)]
    pub devices: Vec<LightConfig>,
}

impl IntegrationConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Parse` for malformed documents or invalid
    /// device values, and the validation error of [`MochadConfig::validate`]
    /// otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use mochad_lib::config::IntegrationConfig;
    ///
    /// let config = IntegrationConfig::from_json(r#"{"devices": [{"address": "A1"}]}"#)?;
    /// assert_eq!(config.mochad.port(), 1099);
    /// assert_eq!(config.devices[0].address().to_string(), "a1");
    /// # Ok::<(), mochad_lib::error::ConfigurationError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Io` if the file cannot be read, and the
    /// errors of [`IntegrationConfig::from_json`] otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded mochad configuration");
        Self::from_json(&json)
    }

    /// Validates the daemon settings.
    ///
    /// # Errors
    ///
    /// See [`MochadConfig::validate`].
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.mochad.validate()
    }
}
