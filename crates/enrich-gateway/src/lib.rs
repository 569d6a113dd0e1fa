// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the enrichment service.
//!
//! Public routes cover health, metrics, key registration, checkout, and
//! payment webhooks. Enrichment routes sit behind API-key or proxy-secret
//! authentication and are metered per request.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, Caller};
pub use error::ApiError;
pub use server::{AppState, router, serve};
