// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered, de-duplicated model fallback chain.

/// Primary model followed by configured fallbacks, first occurrence kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChain {
    models: Vec<String>,
}

impl ModelChain {
    /// Builds the chain from the primary model and a comma-separated list.
    ///
    /// Entries are trimmed; blanks and repeats are dropped.
    pub fn new(primary: &str, fallbacks: &str) -> Self {
        let mut models: Vec<String> = Vec::new();
        for candidate in std::iter::once(primary).chain(fallbacks.split(',')) {
            let candidate = candidate.trim();
            if !candidate.is_empty() && !models.iter().any(|m| m == candidate) {
                models.push(candidate.to_string());
            }
        }
        Self { models }
    }

    pub fn primary(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
