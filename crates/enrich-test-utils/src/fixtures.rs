// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned payloads for tests.

use enrich_core::billing::{CHECKOUT_COMPLETED, SUBSCRIPTION_DELETED};
use enrich_core::types::{AddressInfo, CompanyInfo, DomainInfo, PersonInfo, SearchHit};
use enrich_core::{DataType, EnrichmentResponse};

pub fn hit(title: &str, url: &str, snippet: &str) -> SearchHit {
    SearchHit {
        title: title.into(),
        url: url.into(),
        snippet: snippet.into(),
    }
}

fn empty(data_type: DataType, confidence: f64) -> EnrichmentResponse {
    EnrichmentResponse {
        success: true,
        data_type,
        original_input: String::new(),
        company: None,
        address: None,
        person: None,
        domain_info: None,
        confidence_score: confidence,
        sources: Vec::new(),
    }
}

/// A successful, sparse result of the given type with confidence 0.2.
pub fn low_confidence(data_type: DataType) -> EnrichmentResponse {
    let mut response = empty(data_type, 0.2);
    match data_type {
        DataType::Company => {
            response.company = Some(CompanyInfo {
                name: "Unknown".into(),
                ..Default::default()
            });
        }
        DataType::Address => {
            response.address = Some(AddressInfo {
                country: "Unknown".into(),
                formatted_address: "Unknown".into(),
                ..Default::default()
            });
        }
        DataType::Person => {
            response.person = Some(PersonInfo {
                full_name: "Unknown".into(),
                ..Default::default()
            });
        }
        DataType::Domain => {
            response.domain_info = Some(DomainInfo {
                domain: "unknown".into(),
                ..Default::default()
            });
        }
    }
    response
}

pub fn company_response(name: &str, domain: &str, confidence: f64) -> EnrichmentResponse {
    let mut response = empty(DataType::Company, confidence);
    response.company = Some(CompanyInfo {
        name: name.into(),
        domain: Some(domain.into()),
        ..Default::default()
    });
    response.sources = vec![format!("https://{domain}")];
    response
}

fn event(id: Option<&str>, event_type: &str, object: serde_json::Value) -> Vec<u8> {
    let mut body = serde_json::json!({
        "type": event_type,
        "data": {"object": object},
    });
    if let Some(id) = id {
        body["id"] = serde_json::Value::String(id.into());
    }
    body.to_string().into_bytes()
}

pub fn checkout_completed_event(
    id: Option<&str>,
    email: &str,
    plan: &str,
    subscription_id: &str,
) -> Vec<u8> {
    event(
        id,
        CHECKOUT_COMPLETED,
        serde_json::json!({
            "customer_email": email,
            "metadata": {"plan": plan, "email": email},
            "customer": "cus_test",
            "subscription": subscription_id,
        }),
    )
}

pub fn subscription_deleted_event(id: Option<&str>, subscription_id: &str) -> Vec<u8> {
    event(id, SUBSCRIPTION_DELETED, serde_json::json!({"id": subscription_id}))
}

pub fn other_event(id: Option<&str>, event_type: &str) -> Vec<u8> {
    event(id, event_type, serde_json::json!({}))
}
