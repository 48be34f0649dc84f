// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod db;
pub mod event_bus;
pub mod pdf;
pub mod sms;
pub mod metrics;

pub use event_bus::{DomainEvent, EventBus};
