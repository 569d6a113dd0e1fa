// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stripe webhook signatures.
//!
//! The `Stripe-Signature` header carries `t=<unix seconds>` and one or more
//! `v1=<hex>` entries: HMAC-SHA256 over `"{t}.{payload}"` keyed with the
//! endpoint secret.

use enrich_core::billing::WebhookError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance_secs: u64,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), WebhookError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// Verifies against an explicit clock, in unix seconds.
    pub fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<(), WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut candidates = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::InvalidSignature("missing timestamp".into()))?;
        if candidates.is_empty() {
            return Err(WebhookError::InvalidSignature("missing v1 signature".into()));
        }

        let age = now.abs_diff(timestamp);
        if age > self.tolerance_secs {
            warn!(age_secs = age, "webhook timestamp outside tolerance");
            return Err(WebhookError::InvalidSignature(
                "timestamp outside tolerance".into(),
            ));
        }

        let mac = self.mac(timestamp, payload)?;
        let matched = candidates.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });
        if matched {
            Ok(())
        } else {
            warn!("webhook signature mismatch");
            Err(WebhookError::InvalidSignature("signature mismatch".into()))
        }
    }

    /// Builds a header value for `payload` signed at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, WebhookError> {
        let signature = hex::encode(self.mac(timestamp, payload)?.finalize().into_bytes());
        Ok(format!("t={timestamp},v1={signature}"))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| WebhookError::InvalidSignature(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}
