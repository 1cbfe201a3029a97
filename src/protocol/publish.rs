// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound publications for the host's pub/sub bus.

/// MQTT delivery guarantee for a publication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Qos {
    /// Fire and forget (QoS 0).
    #[default]
    AtMostOnce,
    /// Acknowledged delivery (QoS 1).
    AtLeastOnce,
    /// Assured single delivery (QoS 2).
    ExactlyOnce,
}

impl Qos {
    /// Returns the numeric QoS level.
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

#[cfg(feature = "mqtt")]
impl From<Qos> for rumqttc::QoS {
    fn from(qos: Qos) -> Self {
        match qos {
            Qos::AtMostOnce => Self::AtMostOnce,
            Qos::AtLeastOnce => Self::AtLeastOnce,
            Qos::ExactlyOnce => Self::ExactlyOnce,
        }
    }
}

/// A message to forward onto the host's bus, as `(topic, payload, qos, retain)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// Destination topic.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
    /// Delivery guarantee.
    pub qos: Qos,
    /// Whether the broker should retain the message.
    pub retain: bool,
}

impl Publication {
    /// Creates a non-retained QoS 0 publication.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: Qos::default(),
            retain: false,
        }
    }

    /// Sets the delivery guarantee.
    #[must_use]
    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }

    /// Marks the publication as retained.
    #[must_use]
    pub fn retained(mut self) -> Self {
        self.retain = true;
        self
    }

    /// Returns the payload as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Receiver of inbound X10 events.
///
/// The controller's receive loop calls `publish` for every event it parses.
/// Implementations forward the publication unchanged; they must not block,
/// since they run on the receive loop's task.
///
/// Any `Fn(&Publication)` closure is a publisher:
///
/// ```
/// use std::sync::Arc;
/// use mochad_lib::protocol::{Publication, Publish};
///
/// let publisher: Arc<dyn Publish> = Arc::new(|p: &Publication| {
///     println!("{} -> {:?}", p.topic, p.payload_str());
/// });
/// publisher.publish(&Publication::new("x10/pl/a1", "{}"));
/// ```
pub trait Publish: Send + Sync {
    /// Forwards one publication.
    fn publish(&self, publication: &Publication);
}

impl<F> Publish for F
where
    F: Fn(&Publication) + Send + Sync,
{
    fn publish(&self, publication: &Publication) {
        self(publication);
    }
}
