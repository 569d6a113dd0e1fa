// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for enrichment integration tests.
//!
//! - [`MockSearchProvider`], [`MockModelProvider`], [`MockPaymentProvider`]:
//!   scripted providers with call logs
//! - [`TestHarness`]: the service wired on those mocks and an in-process store
//! - [`fixtures`]: canned responses and webhook bodies

pub mod fixtures;
pub mod harness;
mod lock;
pub mod mock_model;
pub mod mock_payment;
pub mod mock_search;

pub use harness::{TestHarness, test_config};
pub use mock_model::{MockModelProvider, ModelReply};
pub use mock_payment::MockPaymentProvider;
pub use mock_search::MockSearchProvider;
