// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so they can be held as trait objects.

pub mod adapter;
pub mod model;
pub mod payment;
pub mod search;
pub mod store;

pub use adapter::PluginAdapter;
pub use model::ModelProvider;
pub use payment::PaymentProvider;
pub use search::SearchProvider;
pub use store::KvStore;
