// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT publisher using mockforge-mqtt.

#![cfg(feature = "mqtt")]

use std::sync::Arc;
use std::time::Duration;

use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use mochad_lib::protocol::{MqttPublisher, Publication, Publish, Qos};
use tokio::time::sleep;

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind before clients connect
    sleep(Duration::from_millis(500)).await;
}

// ============================================================================
// Connection
// ============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn connect_to_broker() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttPublisher::connect(format!("mqtt://127.0.0.1:{port}")).await;
        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
    }

    #[tokio::test]
    async fn connect_without_scheme() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttPublisher::connect(format!("127.0.0.1:{port}")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn builder_with_options() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttPublisher::builder()
            .broker(format!("tcp://127.0.0.1:{port}"))
            .client_id("mochad_test_client")
            .keep_alive(Duration::from_secs(10))
            .build()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn invalid_url_fails() {
        let result = MqttPublisher::connect("mqtt://127.0.0.1:notaport").await;
        assert!(result.is_err());
    }
}

// ============================================================================
// Publishing
// ============================================================================

mod publishing {
    use super::*;

    #[tokio::test]
    async fn try_publish_queues_event() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let publisher = MqttPublisher::connect(format!("mqtt://127.0.0.1:{port}"))
            .await
            .unwrap();

        let publication = Publication::new(
            "x10/pl/a1",
            r#"{"func":"on","received_at":"2024-05-21T21:07:46+00:00"}"#,
        );
        assert!(publisher.try_publish(&publication).is_ok());

        let acked = Publication::new("x10/rf/b3", "{}").with_qos(Qos::AtLeastOnce);
        assert!(publisher.try_publish(&acked).is_ok());

        publisher.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn usable_as_shared_publisher() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let publisher: Arc<dyn Publish> = Arc::new(
            MqttPublisher::connect(format!("mqtt://127.0.0.1:{port}"))
                .await
                .unwrap(),
        );

        // Never panics or blocks, even in a burst
        for unit in 1..=16 {
            publisher.publish(&Publication::new(format!("x10/pl/a{unit}"), "{}"));
        }
    }
}
