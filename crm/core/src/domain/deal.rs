// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deal
//!
//! Commercial transaction derived from a lead. Documents are always owned by a deal.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements deal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadId;

/// Surrogate key of a deal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub i64);

impl std::fmt::Display for DealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status given to deals opened implicitly by the document workflow
pub const DEAL_STATUS_NEW: &str = "new";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub lead_id: LeadId,
    /// Amount in minor currency units (tiyn, cents)
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Deal {
    /// Human readable amount, e.g. `150000.50`
    pub fn formatted_amount(&self) -> String {
        format_minor_units(self.amount_minor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeal {
    pub lead_id: LeadId,
    #[serde(default)]
    pub amount_minor: i64,
    #[serde(default)]
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl NewDeal {
    /// Empty deal opened for a lead that has none yet
    pub fn opened_for(lead_id: LeadId, created_at: DateTime<Utc>) -> Self {
        Self {
            lead_id,
            amount_minor: 0,
            currency: String::new(),
            status: DEAL_STATUS_NEW.to_string(),
            created_at,
        }
    }
}

fn format_minor_units(amount_minor: i64) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_amount() {
        assert_eq!(format_minor_units(15_000_050), "150000.50");
        assert_eq!(format_minor_units(7), "0.07");
        assert_eq!(format_minor_units(-1250), "-12.50");
    }

    #[test]
    fn test_opened_for_uses_new_status() {
        let deal = NewDeal::opened_for(LeadId(42), Utc::now());
        assert_eq!(deal.status, "new");
        assert_eq!(deal.amount_minor, 0);
        assert_eq!(deal.lead_id, LeadId(42));
    }
}
