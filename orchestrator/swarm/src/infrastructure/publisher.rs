// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::application::ports::EventPublisher;
use async_trait::async_trait;
use hive_core::domain::events::DomainEvent;
use hive_core::infrastructure::event_bus::EventBus;
use tracing::trace;

/// The in-memory bus acknowledges once the event is in its log.
#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: DomainEvent) -> anyhow::Result<()> {
        let recorded = EventBus::publish(self, event);
        trace!(
            sequence = recorded.sequence,
            event_type = recorded.event.event_type(),
            "Event published"
        );
        Ok(())
    }
}
