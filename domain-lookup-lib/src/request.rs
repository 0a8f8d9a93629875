//! Batch request validation.
//!
//! Pure transformation from the raw API-boundary shape into a validated
//! [`LookupRequest`]: trimming, case-insensitive deduplication preserving
//! first-seen order, field allow-list enforcement, and the batch ceiling.
//! Fails before any network I/O is attempted.

use crate::error::LookupError;
use crate::types::{Field, LookupRequest, RawLookupRequest};
use std::collections::HashSet;

/// Longest domain name the pipeline will accept (RFC 1035 limit).
const MAX_DOMAIN_LEN: usize = 253;

/// Validate and normalize a raw batch request.
///
/// Domains are trimmed, lowercased, and deduplicated case-insensitively
/// preserving the first occurrence; blank lines are dropped. Field keys
/// must all come from the closed [`Field`] enumeration. A batch whose
/// deduplicated count exceeds `max_domains` is rejected wholesale.
///
/// # Errors
///
/// Returns `LookupError::InvalidRequest` if:
/// - no non-blank domains remain after cleaning
/// - the deduplicated count exceeds the ceiling
/// - any field key is unknown, or no fields were requested
pub fn validate_request(
    raw: &RawLookupRequest,
    max_domains: usize,
) -> Result<LookupRequest, LookupError> {
    let fields = parse_fields(&raw.fields)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut domains = Vec::new();

    for input in &raw.domains {
        let domain = input.trim().to_lowercase();
        if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
            continue;
        }
        if seen.insert(domain.clone()) {
            domains.push(domain);
        }
    }

    if domains.is_empty() {
        return Err(LookupError::invalid_request("No valid domains provided"));
    }

    if domains.len() > max_domains {
        return Err(LookupError::invalid_request(format!(
            "Batch of {} domains exceeds the limit of {}",
            domains.len(),
            max_domains
        )));
    }

    Ok(LookupRequest {
        domains,
        fields,
        use_rdap: raw.use_rdap,
    })
}

/// Parse the requested field keys against the closed enumeration,
/// preserving request order and dropping duplicates.
fn parse_fields(raw_fields: &[String]) -> Result<Vec<Field>, LookupError> {
    let mut fields = Vec::new();

    for raw in raw_fields {
        let field: Field = raw.parse()?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    if fields.is_empty() {
        return Err(LookupError::invalid_request("No fields requested"));
    }

    Ok(fields)
}
