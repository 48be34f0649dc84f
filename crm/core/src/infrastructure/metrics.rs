// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workflow counters
//!
//! Recorded through the `metrics` facade; without an installed recorder every
//! call is a no-op. The CLI installs the Prometheus exporter when
//! `spec.observability.metrics_port` is set.

use metrics::{counter, describe_counter};

pub const DOCUMENTS_CREATED: &str = "turcrm_documents_created_total";
pub const SMS_SENT: &str = "turcrm_sms_sent_total";
pub const SMS_CONFIRMATIONS: &str = "turcrm_sms_confirmations_total";

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!(DOCUMENTS_CREATED, "Documents persisted, by document type");
    describe_counter!(SMS_SENT, "Confirmation messages accepted by the SMS provider");
    describe_counter!(SMS_CONFIRMATIONS, "Confirmation attempts, by outcome");
}

pub fn record_document_created(doc_type: &str) {
    counter!(DOCUMENTS_CREATED, "doc_type" => doc_type.to_string()).increment(1);
}

/// `kind` is `"new"` for a fresh code or `"redelivery"` for a resent one
pub fn record_sms_sent(provider: &'static str, kind: &'static str) {
    counter!(SMS_SENT, "provider" => provider, "kind" => kind).increment(1);
}

pub fn record_confirmation(result: &'static str) {
    counter!(SMS_CONFIRMATIONS, "result" => result).increment(1);
}
