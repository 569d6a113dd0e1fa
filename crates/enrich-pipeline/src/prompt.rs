// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt text for structured extraction.

use enrich_core::{DataType, EnrichmentRequest};

pub const SYSTEM_PROMPT: &str = "You are a data enrichment specialist. Your task is to analyze
web search results and extract accurate, structured information.

IMPORTANT:
1. Only use information found in the provided search results
2. Set confidence_score based on how much data you found (0.9+ if comprehensive, 0.5-0.7 if partial)
3. List the actual URLs from search results in the sources field
4. Leave fields as null if the information is not found in the search results
5. Do not hallucinate or make up information not present in the search data
";

pub const SEARCH_RESULTS_START: &str = "=== LIVE SEARCH RESULTS ===";
pub const SEARCH_RESULTS_END: &str = "=== END SEARCH RESULTS ===";

/// Per-type list of fields to extract.
pub fn instructions(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Company => {
            "Extract from the search results:
- Official company name (exact spelling from sources)
- Website domain
- Industry/sector
- Brief description
- Headquarters location
- Founded year
- Employee count range
- LinkedIn URL if found"
        }
        DataType::Address => {
            "Parse and validate from search results:
- Street address
- City
- State/province
- Postal/ZIP code
- Country
- Full formatted address"
        }
        DataType::Person => {
            "Extract from search results:
- Full name
- First and last name
- Professional title
- Current company
- LinkedIn URL if found"
        }
        DataType::Domain => {
            "Extract from search results for the domain_info field:
- The domain name
- Company name that owns this domain
- Industry/sector
- Brief description of the website/company
- Headquarters location
- Founded year
- Employee count range
- Technologies used (if mentioned)
- Social media profiles (LinkedIn, Twitter, etc.)"
        }
    }
}

/// The user turn: raw input, the delimited evidence block, then instructions.
pub fn user_message(request: &EnrichmentRequest, evidence: &str) -> String {
    format!(
        "Please enrich the following {data_type} data using ONLY the search results provided.

Raw input: {raw}

{SEARCH_RESULTS_START}
{evidence}
{SEARCH_RESULTS_END}

{instructions}

Extract and structure the data from the search results above.",
        data_type = request.data_type(),
        raw = request.raw_data(),
        instructions = instructions(request.data_type()),
    )
}
