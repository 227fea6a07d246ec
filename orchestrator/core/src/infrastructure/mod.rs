// Copyright (c) 2026 Hive Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;

pub use event_bus::{EventBus, EventBusError, EventLog, EventReceiver, RecordedEvent};
