// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast bus for host lifecycle events.

use tokio::sync::broadcast;

use super::HostEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Bus broadcasting [`HostEvent`]s to every subscriber.
///
/// Each subscriber gets its own copy of every event published after it
/// subscribed. Lifecycle events are rare, so the default capacity is small;
/// a subscriber that falls behind receives `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use mochad_lib::event::{HostEvent, HostEventBus};
///
/// let bus = HostEventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(HostEvent::Stopping);
///
/// // Clones share the same channel
/// let other = bus.clone();
/// assert_eq!(other.subscriber_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HostEventBus {
    sender: broadcast::Sender<HostEvent>,
}

impl HostEventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events that can be buffered
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to host events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// If there are no subscribers, the event is silently discarded.
    pub fn publish(&self, event: HostEvent) {
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!(event = %event, subscribers = delivered, "Published host event");
    }
}

impl Default for HostEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bus_has_no_subscribers() {
        let bus = HostEventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn drop_subscriber_decrements_count() {
        let bus = HostEventBus::new();

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn publish_delivers_in_order() {
        let bus = HostEventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(HostEvent::Started);
        bus.publish(HostEvent::Stopping);

        assert_eq!(rx.recv().await.unwrap(), HostEvent::Started);
        assert_eq!(rx.recv().await.unwrap(), HostEvent::Stopping);
    }

    #[test]
    fn events_published_before_subscribing_are_missed() {
        let bus = HostEventBus::new();
        bus.publish(HostEvent::Started);

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
