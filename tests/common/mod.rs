//! Shared fixtures for integration tests

#![allow(dead_code)]

pub mod builders;
pub mod mock_service;
pub mod strategies;

use pharmadesk_core::events::PublishedEvent;
use pharmadesk_core::SessionEvent;
use tokio::sync::broadcast;

/// Let spawned tasks run to their next suspension point
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Everything currently queued on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<PublishedEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(published) = rx.try_recv() {
        events.push(published.event);
    }
    events
}
