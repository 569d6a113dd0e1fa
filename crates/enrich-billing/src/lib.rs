// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing for the enrichment service.
//!
//! - [`plans`]: plan quotas and price ids
//! - [`accounts`]: API keys and monthly metering
//! - [`checkout`]: checkout sessions with an idempotency cache
//! - [`webhook`]: webhook application with event-id dedup
//! - [`stripe`], [`signature`]: the Stripe adapter

pub mod accounts;
pub mod checkout;
pub mod plans;
pub mod signature;
pub mod stripe;
pub mod webhook;

pub use accounts::{AccountStore, KeyValidation, Registration};
pub use checkout::{CheckoutOutcome, CheckoutService};
pub use plans::{Plan, PlanPrices};
pub use signature::SignatureVerifier;
pub use stripe::StripeClient;
pub use webhook::{WebhookHandler, WebhookOutcome, WebhookStatus};
