// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the enrichment service.
//!
//! Provides the adapter traits (search, model, payment, store), the error
//! taxonomy shared by every orchestrator, and the enrichment data model.

pub mod billing;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{BudgetPhase, EnrichError, ProviderError};
pub use types::{
    AdapterType, BatchEnrichmentRequest, BatchEnrichmentResponse, DataType, EnrichmentRequest,
    EnrichmentResponse, HealthStatus,
};

pub use traits::{KvStore, ModelProvider, PaymentProvider, PluginAdapter, SearchProvider};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompanyInfo, PersonInfo};

    fn company_response(success: bool) -> EnrichmentResponse {
        EnrichmentResponse {
            success,
            data_type: DataType::Company,
            original_input: "Stripe".into(),
            company: Some(CompanyInfo {
                name: "Stripe, Inc.".into(),
                ..Default::default()
            }),
            address: None,
            person: None,
            domain_info: None,
            confidence_score: 0.9,
            sources: vec!["https://stripe.com".into()],
        }
    }

    #[test]
    fn enrich_error_variants_construct() {
        let _config = EnrichError::Config("test".into());
        let _storage = EnrichError::storage(std::io::Error::other("test"));
        let _provider = EnrichError::Provider {
            message: "test".into(),
            source: None,
        };
        let _validation = EnrichError::Validation("test".into());
        let _plan = EnrichError::InvalidPlan("gold".into());
        let upstream = EnrichError::upstream("LLM provider", "down", Some(ProviderError::Timeout));
        assert!(upstream.is_service_unavailable());
        let timeout = EnrichError::EnrichmentTimeout {
            phase: BudgetPhase::Search,
            budget: std::time::Duration::from_secs(30),
        };
        assert!(timeout.is_service_unavailable());
        assert!(timeout.to_string().contains("search phase"));
        assert!(!EnrichError::Cancelled.is_service_unavailable());
    }

    #[test]
    fn provider_error_from_status() {
        assert_eq!(
            ProviderError::from_status(429, "slow down"),
            ProviderError::RateLimited("slow down".into())
        );
        let overloaded = ProviderError::from_status(529, "overloaded_error");
        assert_eq!(overloaded.status(), Some(529));
        assert!(overloaded.to_string().contains("error code: 529"));
        assert!(matches!(
            ProviderError::from_status(404, "missing"),
            ProviderError::Status { status: 404, .. }
        ));
    }

    #[test]
    fn request_trims_and_lowercases() {
        let req = EnrichmentRequest::new("  Stripe  ", "COMPANY").unwrap();
        assert_eq!(req.raw_data(), "Stripe");
        assert_eq!(req.data_type(), DataType::Company);
    }

    #[test]
    fn request_rejects_empty_and_oversized() {
        assert!(matches!(
            EnrichmentRequest::new("   ", "company"),
            Err(EnrichError::Validation(_))
        ));
        let long = "x".repeat(types::MAX_RAW_DATA_CHARS + 1);
        assert!(EnrichmentRequest::new(&long, "company").is_err());
        let max = "x".repeat(types::MAX_RAW_DATA_CHARS);
        assert!(EnrichmentRequest::new(&max, "company").is_ok());
    }

    #[test]
    fn request_rejects_unknown_data_type() {
        let err = EnrichmentRequest::new("Stripe", "planet").unwrap_err();
        assert!(err.to_string().contains("data_type must be one of"));
    }

    #[test]
    fn request_deserializes_with_default_type_and_rejects_extra_fields() {
        let req: EnrichmentRequest = serde_json::from_str(r#"{"raw_data": "Stripe"}"#).unwrap();
        assert_eq!(req.data_type(), DataType::Company);

        let extra = serde_json::from_str::<EnrichmentRequest>(
            r#"{"raw_data": "Stripe", "data_type": "company", "priority": 1}"#,
        );
        assert!(extra.is_err());

        let blank = serde_json::from_str::<EnrichmentRequest>(r#"{"raw_data": "  "}"#);
        assert!(blank.is_err());
    }

    #[test]
    fn response_validation_accepts_matching_payload() {
        assert!(company_response(true).validate(DataType::Company).is_ok());
    }

    #[test]
    fn response_validation_rejects_mismatches() {
        let resp = company_response(true);
        assert!(resp.validate(DataType::Person).is_err());

        let mut wrong_payload = company_response(true);
        wrong_payload.person = Some(PersonInfo {
            full_name: "Patrick".into(),
            ..Default::default()
        });
        assert!(wrong_payload.validate(DataType::Company).is_err());

        let mut bad_score = company_response(true);
        bad_score.confidence_score = 1.5;
        assert!(bad_score.validate(DataType::Company).is_err());

        let mut empty_success = company_response(true);
        empty_success.company = None;
        assert!(empty_success.validate(DataType::Company).is_err());

        let mut empty_failure = company_response(false);
        empty_failure.company = None;
        assert!(empty_failure.validate(DataType::Company).is_ok());
    }

    #[test]
    fn failed_response_has_no_payload() {
        let req = EnrichmentRequest::new("stripe.com", "domain").unwrap();
        let resp = EnrichmentResponse::failed(&req);
        assert!(!resp.success);
        assert_eq!(resp.data_type, DataType::Domain);
        assert!(resp.populated_payloads().is_empty());
        assert_eq!(resp.confidence_score, 0.0);
    }

    #[test]
    fn batch_summary_counts() {
        let req = EnrichmentRequest::new("Stripe", "company").unwrap();
        let batch = BatchEnrichmentResponse::from_results(vec![
            company_response(true),
            EnrichmentResponse::failed(&req),
        ]);
        assert_eq!(batch.total, 2);
        assert_eq!(batch.successful, 1);
        assert_eq!(batch.failed, 1);
        assert!(batch.success);
    }

    #[test]
    fn json_schema_describes_payloads() {
        let schema = EnrichmentResponse::json_schema();
        let text = schema.to_string();
        assert!(text.contains("confidence_score"));
        assert!(text.contains("domain_info"));
    }

    #[test]
    fn data_type_round_trips_through_strum_and_serde() {
        use std::str::FromStr;
        for variant in [
            DataType::Company,
            DataType::Address,
            DataType::Person,
            DataType::Domain,
        ] {
            let s = variant.to_string();
            assert_eq!(DataType::from_str(&s).unwrap(), variant);
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_search<T: SearchProvider>() {}
        fn _assert_model<T: ModelProvider>() {}
        fn _assert_payment<T: PaymentProvider>() {}
        fn _assert_store<T: KvStore>() {}
    }

    proptest::proptest! {
        #[test]
        fn trimmed_non_empty_input_is_accepted(s in "[a-zA-Z0-9 .,-]{1,200}") {
            let result = EnrichmentRequest::new(&s, "person");
            if s.trim().is_empty() {
                proptest::prop_assert!(result.is_err());
            } else {
                let req = result.unwrap();
                proptest::prop_assert_eq!(req.raw_data(), s.trim());
            }
        }
    }
}
