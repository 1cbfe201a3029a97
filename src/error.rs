// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the mochad library.
//!
//! Configuration problems are the only failures that reach a caller during
//! normal operation. Command sends are best-effort: the X10 protocol is
//! one-way, so transport failures are logged and swallowed by the light
//! adapter instead of being returned.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The integration configuration was rejected.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the daemon or the MQTT broker.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors raised while validating integration configuration.
///
/// Any of these makes the whole integration instance unavailable; no light
/// is created from a configuration that failed validation.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The daemon host is empty or malformed.
    #[error("invalid mochad host: {0:?}")]
    InvalidHost(String),

    /// The daemon port is outside 1-65535.
    #[error("invalid mochad port: {0}")]
    InvalidPort(u16),

    /// The event topic prefix is empty or contains MQTT wildcards.
    #[error("invalid topic prefix: {0:?}")]
    InvalidTopicPrefix(String),

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Not a house letter (A-P) followed by a unit number (1-16).
    #[error("invalid X10 address: {0:?}")]
    InvalidAddress(String),

    /// Brightness levels other than 32, 64 or 256.
    #[error("unsupported brightness levels {0}, expected one of 32, 64, 256")]
    InvalidBrightnessLevels(u16),

    /// Unknown communication type.
    #[error("invalid comm type: {0:?}, expected \"pl\" or \"rf\"")]
    InvalidCommType(String),
}

/// Errors related to daemon and broker communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the daemon failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The daemon closed the connection.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
