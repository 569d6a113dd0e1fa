// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription plans, quotas and configured price ids.

use std::str::FromStr;

use enrich_config::model::BillingConfig;
use enrich_core::EnrichError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Basic,
    Pro,
    Ultra,
}

impl Plan {
    pub fn requests_per_month(self) -> u32 {
        match self {
            Self::Free => 50,
            Self::Basic => 500,
            Self::Pro => 2000,
            Self::Ultra => 10_000,
        }
    }

    /// Monthly price in cents.
    pub fn price_cents(self) -> u32 {
        match self {
            Self::Free => 0,
            Self::Basic => 999,
            Self::Pro => 2999,
            Self::Ultra => 9999,
        }
    }

    pub fn is_paid(self) -> bool {
        self != Self::Free
    }

    /// Parses a plan that can be bought through checkout.
    pub fn parse_paid(name: &str) -> Result<Self, EnrichError> {
        match Self::from_str(name) {
            Ok(plan) if plan.is_paid() => Ok(plan),
            _ => Err(EnrichError::InvalidPlan(
                "Invalid plan. Choose: basic, pro, or ultra".into(),
            )),
        }
    }
}

/// Stripe price ids for the paid plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanPrices {
    pub basic: Option<String>,
    pub pro: Option<String>,
    pub ultra: Option<String>,
}

impl PlanPrices {
    /// Reads price ids from config, falling back to `STRIPE_PRICE_*`.
    pub fn from_config(config: &BillingConfig) -> Self {
        Self {
            basic: enrich_config::resolve_secret(config.price_basic.as_deref(), "STRIPE_PRICE_BASIC"),
            pro: enrich_config::resolve_secret(config.price_pro.as_deref(), "STRIPE_PRICE_PRO"),
            ultra: enrich_config::resolve_secret(config.price_ultra.as_deref(), "STRIPE_PRICE_ULTRA"),
        }
    }

    pub fn price_id(&self, plan: Plan) -> Option<&str> {
        match plan {
            Plan::Free => None,
            Plan::Basic => self.basic.as_deref(),
            Plan::Pro => self.pro.as_deref(),
            Plan::Ultra => self.ultra.as_deref(),
        }
    }
}
