//! Tests for the adapters

use super::*;
use crate::domain::{DiscoveryEvent, PacketKind};
use crate::ports::{DiscoveryEventPublisher, TimeSource};
use std::net::SocketAddr;

fn sent(port: u16) -> DiscoveryEvent {
    DiscoveryEvent::PacketSent {
        kind: PacketKind::Ping,
        to: SocketAddr::from(([127, 0, 0, 1], port)),
    }
}

#[test]
fn test_system_time_source_returns_nonzero() {
    let now = SystemTimeSource::new().now();
    // After ~2024
    assert!(now.as_secs() > 1_700_000_000);
}

#[test]
fn test_publish_without_subscribers_is_not_an_error() {
    let bus = BroadcastEventPublisher::new(4);
    assert_eq!(bus.publish(sent(1)), 0);
}

#[tokio::test]
async fn test_subscription_sees_events_in_order() {
    let bus = BroadcastEventPublisher::new(8);
    let mut sub = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);

    assert_eq!(bus.publish(sent(1)), 1);
    assert_eq!(bus.publish(sent(2)), 1);

    assert_eq!(sub.recv().await, Some(sent(1)));
    assert_eq!(sub.recv().await, Some(sent(2)));
    assert_eq!(sub.try_recv(), Ok(None));
}

#[tokio::test]
async fn test_lagging_subscription_skips_and_counts() {
    let bus = BroadcastEventPublisher::new(2);
    let mut sub = bus.subscribe();
    for port in 1..=5 {
        bus.publish(sent(port));
    }

    // Only the newest two survive.
    assert_eq!(sub.recv().await, Some(sent(4)));
    assert_eq!(sub.missed(), 3);
    assert_eq!(sub.recv().await, Some(sent(5)));
}

#[tokio::test]
async fn test_subscription_ends_when_bus_dropped() {
    let bus = BroadcastEventPublisher::new(2);
    let mut sub = bus.subscribe();
    drop(bus);
    assert_eq!(sub.recv().await, None);
    assert_eq!(sub.try_recv(), Err(SubscriptionError::Closed));
}

#[test]
fn test_in_memory_publisher_records() {
    let publisher = InMemoryEventPublisher::new();
    publisher.publish(sent(7));
    assert_eq!(publisher.events(), vec![sent(7)]);
    publisher.clear();
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn test_oversized_capacity_is_clamped() {
    let bus = BroadcastEventPublisher::new(usize::MAX);
    let mut sub = bus.subscribe();
    assert_eq!(bus.publish(sent(1)), 1);
    assert_eq!(sub.recv().await, Some(sent(1)));
}
