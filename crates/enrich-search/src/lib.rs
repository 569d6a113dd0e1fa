// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web search for the enrichment service: the Serper adapter and the
//! orchestrator that turns a request into labelled evidence.

pub mod client;
pub mod orchestrator;

pub use client::SerperClient;
pub use orchestrator::{SearchOrchestrator, plan_searches};
