// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT publisher forwarding X10 events to a broker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions};

use super::{Publication, Publish};
use crate::error::ProtocolError;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Capacity of the request channel between the client and its event loop.
const REQUEST_CAPACITY: usize = 64;

/// [`Publish`] implementation that sends publications to an MQTT broker.
///
/// Publishing never blocks: publications are queued on the client's request
/// channel and delivered by a background event loop. If the queue is full
/// the publication is dropped with a warning.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use mochad_lib::protocol::{MqttPublisher, Publish};
///
/// # async fn example() -> mochad_lib::Result<()> {
/// let publisher: Arc<dyn Publish> =
///     Arc::new(MqttPublisher::connect("mqtt://192.168.1.50:1883").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Connects to an MQTT broker with default options.
    ///
    /// # Arguments
    ///
    /// * `broker_url` - The MQTT broker URL (e.g., `mqtt://192.168.1.50:1883`)
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL is invalid.
    pub async fn connect(broker_url: impl Into<String>) -> Result<Self, ProtocolError> {
        MqttPublisherBuilder::new().broker(broker_url).build().await
    }

    /// Returns a builder for custom options.
    #[must_use]
    pub fn builder() -> MqttPublisherBuilder {
        MqttPublisherBuilder::new()
    }

    /// Queues a publication, reporting failure.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Mqtt` if the request queue is full or the
    /// event loop has stopped.
    pub fn try_publish(&self, publication: &Publication) -> Result<(), ProtocolError> {
        tracing::debug!(
            topic = %publication.topic,
            qos = publication.qos.level(),
            retain = publication.retain,
            "Publishing MQTT message"
        );

        self.client
            .try_publish(
                publication.topic.as_str(),
                publication.qos.into(),
                publication.retain,
                publication.payload.clone(),
            )
            .map_err(ProtocolError::Mqtt)
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Mqtt` if the request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        self.client.disconnect().await.map_err(ProtocolError::Mqtt)
    }
}

impl Publish for MqttPublisher {
    fn publish(&self, publication: &Publication) {
        if let Err(e) = self.try_publish(publication) {
            tracing::warn!(topic = %publication.topic, error = %e, "Failed to publish X10 event");
        }
    }
}

/// Builder for an [`MqttPublisher`] with custom configuration.
#[derive(Debug, Default)]
pub struct MqttPublisherBuilder {
    broker: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    keep_alive: Option<Duration>,
}

impl MqttPublisherBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MQTT broker URL.
    #[must_use]
    pub fn broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = Some(broker.into());
        self
    }

    /// Sets authentication credentials for the MQTT broker.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = Some(duration);
        self
    }

    /// Builds the publisher and starts its event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the broker is missing or its URL is invalid.
    pub async fn build(self) -> Result<MqttPublisher, ProtocolError> {
        let broker = self
            .broker
            .ok_or_else(|| ProtocolError::InvalidAddress("broker is required".to_string()))?;

        let (host, port) = parse_mqtt_url(&broker)?;

        // PID + counter to avoid clashing with other processes on the broker
        let client_id = self.client_id.unwrap_or_else(|| {
            let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("mochad_{}_{}", std::process::id(), counter)
        });

        let mut mqtt_options = MqttOptions::new(&client_id, host, port);
        mqtt_options.set_keep_alive(self.keep_alive.unwrap_or(Duration::from_secs(30)));
        mqtt_options.set_clean_session(true);

        if let (Some(username), Some(password)) = (self.username, self.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);

        tokio::spawn(async move {
            handle_mqtt_events(event_loop).await;
        });

        // Let the CONNECT go out before the first publication is queued
        tokio::time::sleep(Duration::from_millis(200)).await;

        Ok(MqttPublisher { client })
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    if url.is_empty() {
        return Err(ProtocolError::InvalidAddress("empty broker host".to_string()));
    }

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    Ok((host, port))
}

/// Drives the MQTT event loop in the background.
async fn handle_mqtt_events(mut event_loop: EventLoop) {
    use rumqttc::{Event, Packet};

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connected");
            }
            Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                tracing::debug!("MQTT disconnect requested");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT event loop error");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mqtt_url_with_port() {
        let (host, port) = parse_mqtt_url("mqtt://192.168.1.50:1883").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_default_port() {
        let (host, port) = parse_mqtt_url("broker.local").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_mqtt_url_rejects_bad_port() {
        assert!(parse_mqtt_url("tcp://broker:abc").is_err());
        assert!(parse_mqtt_url("mqtt://").is_err());
    }

    #[test]
    fn builder_collects_options() {
        let builder = MqttPublisherBuilder::new()
            .broker("mqtt://broker:1883")
            .credentials("user", "pass")
            .client_id("my_client")
            .keep_alive(Duration::from_secs(60));

        assert_eq!(builder.broker, Some("mqtt://broker:1883".to_string()));
        assert_eq!(builder.username, Some("user".to_string()));
        assert_eq!(builder.password, Some("pass".to_string()));
        assert_eq!(builder.client_id, Some("my_client".to_string()));
        assert_eq!(builder.keep_alive, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn build_without_broker_fails() {
        let result = MqttPublisherBuilder::new().build().await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }
}
