// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Provides mod functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements mod

pub mod lead;
pub mod deal;
pub mod document;
pub mod sms_confirmation;
pub mod events;
pub mod repository;
pub mod pdf;
pub mod sms;
pub mod crm_config;
