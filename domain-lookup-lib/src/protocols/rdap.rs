//! RDAP (Registration Data Access Protocol) client.
//!
//! Issues a domain query against the bootstrap-resolved RDAP server and
//! parses the structured JSON response into a normalized [`DomainRecord`].
//! RDAP never exposes registrant names or nexus categories to this system,
//! so those fields always carry the "not available" sentinel. A single call
//! never retries; retry/fallback policy belongs to the orchestrator.

use crate::error::LookupError;
use crate::normalize::normalize_statuses;
use crate::protocols::bootstrap::BootstrapRegistry;
use crate::protocols::extract_tld;
use crate::types::{DomainRecord, NOT_AVAILABLE_VIA_RDAP};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// RDAP client for querying domain registration data.
#[derive(Clone)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http: reqwest::Client,
    /// Timeout for a single RDAP query (resolution + request + parse)
    timeout: Duration,
    /// Shared TLD -> base URL registry
    registry: Arc<BootstrapRegistry>,
}

impl RdapClient {
    /// Create a new RDAP client over the given bootstrap registry.
    pub fn new(timeout: Duration, registry: Arc<BootstrapRegistry>) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(timeout + Duration::from_secs(2)) // Buffer over the logical timeout
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| {
                LookupError::network_with_source(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http,
            timeout,
            registry,
        })
    }

    /// Query registration data for one domain via RDAP.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if:
    /// - the TLD has no registered RDAP service (`BootstrapError`)
    /// - the server answers non-2xx (`RdapError` with the status code;
    ///   404 means the domain does not exist)
    /// - the body cannot be parsed as JSON
    /// - the call exceeds the configured timeout
    ///
    /// Missing optional fields (registrar, dates, nameservers) are NOT
    /// errors — they are simply left unset in the record.
    pub async fn query_domain(&self, domain: &str) -> Result<DomainRecord, LookupError> {
        let tld = extract_tld(domain)?;
        let base = self.registry.resolve(&tld).await?;
        let url = format!("{}/domain/{}", base, domain);

        debug!(domain, url = %url, "RDAP query");

        match tokio::time::timeout(self.timeout, self.fetch_record(&url, domain)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::timeout("RDAP request", self.timeout)),
        }
    }

    async fn fetch_record(&self, url: &str, domain: &str) -> Result<DomainRecord, LookupError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/rdap+json, application/json")
            .send()
            .await
            .map_err(|e| LookupError::rdap(domain, format!("Request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => {
                let json = response.json::<serde_json::Value>().await.map_err(|e| {
                    LookupError::rdap(domain, format!("Failed to parse JSON: {}", e))
                })?;
                Ok(parse_rdap_record(&json))
            }
            StatusCode::NOT_FOUND => Err(LookupError::rdap_with_status(
                domain,
                "Domain not found in registry",
                404,
            )),
            StatusCode::TOO_MANY_REQUESTS => Err(LookupError::rdap_with_status(
                domain,
                "RDAP server rate limit reached",
                429,
            )),
            code => Err(LookupError::rdap_with_status(
                domain,
                format!("RDAP server returned error: {}", code),
                code.as_u16(),
            )),
        }
    }
}

/// Parse an RDAP JSON response into a normalized record.
///
/// Extracts the registrar entity's vCard display name, normalized EPP
/// status codes, the registration event date (verbatim — RDAP dates are
/// already ISO-8601), and lowercased nameserver hostnames.
pub fn parse_rdap_record(json: &serde_json::Value) -> DomainRecord {
    let mut record = DomainRecord {
        // RDAP responses for this system never expose these
        registrant_name: Some(NOT_AVAILABLE_VIA_RDAP.to_string()),
        nexus_categories: Some(NOT_AVAILABLE_VIA_RDAP.to_string()),
        ..Default::default()
    };

    // Registrar: the entity with role "registrar", vCard name preferred
    if let Some(entities) = json.get("entities").and_then(|e| e.as_array()) {
        for entity in entities {
            let is_registrar = entity
                .get("roles")
                .and_then(|r| r.as_array())
                .map(|roles| roles.iter().any(|role| role.as_str() == Some("registrar")))
                .unwrap_or(false);

            if is_registrar {
                record.registrar =
                    extract_vcard_name(entity).or_else(|| extract_entity_identifier(entity));
                if record.registrar.is_some() {
                    break;
                }
            }
        }
    }

    // Statuses: strings or {type: ...} objects, both occur in the wild
    if let Some(statuses) = json.get("status").and_then(|s| s.as_array()) {
        let raw: Vec<String> = statuses
            .iter()
            .filter_map(|s| {
                s.as_str()
                    .map(String::from)
                    .or_else(|| s.get("type").and_then(|t| t.as_str()).map(String::from))
            })
            .collect();
        record.statuses = normalize_statuses(raw);
    }

    // Creation date: the "registration" event, emitted verbatim
    if let Some(events) = json.get("events").and_then(|e| e.as_array()) {
        for event in events {
            if event.get("eventAction").and_then(|a| a.as_str()) == Some("registration") {
                record.creation_date = event
                    .get("eventDate")
                    .and_then(|d| d.as_str())
                    .map(String::from);
                break;
            }
        }
    }

    // Nameservers: ldhName entries, lowercased
    if let Some(nameservers) = json.get("nameservers").and_then(|ns| ns.as_array()) {
        for ns in nameservers {
            if let Some(name) = ns.get("ldhName").and_then(|n| n.as_str()) {
                let host = name.to_lowercase();
                if !record.nameservers.contains(&host) {
                    record.nameservers.push(host);
                }
            }
        }
    }

    record
}

/// Extract the display name ("fn" item) from an RDAP entity's vCard array.
fn extract_vcard_name(entity: &serde_json::Value) -> Option<String> {
    entity
        .get("vcardArray")
        .and_then(|v| v.as_array())
        .and_then(|a| a.get(1))
        .and_then(|a| a.as_array())
        .and_then(|items| {
            for item in items {
                if let Some(item_array) = item.as_array() {
                    if item_array.len() >= 4
                        && item_array.first().and_then(|f| f.as_str()) == Some("fn")
                    {
                        return item_array.get(3).and_then(|n| n.as_str()).map(String::from);
                    }
                }
            }
            None
        })
}

/// Fallback registrar identifier from publicIds, handle, or name.
fn extract_entity_identifier(entity: &serde_json::Value) -> Option<String> {
    if let Some(id) = entity
        .get("publicIds")
        .and_then(|p| p.as_array())
        .and_then(|ids| ids.first())
        .and_then(|id| id.get("identifier"))
        .and_then(|i| i.as_str())
    {
        return Some(id.to_string());
    }

    if let Some(handle) = entity.get("handle").and_then(|h| h.as_str()) {
        return Some(handle.to_string());
    }

    entity.get("name").and_then(|n| n.as_str()).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let json = serde_json::json!({
            "ldhName": "EXAMPLE.COM",
            "entities": [
                {
                    "roles": ["registrar"],
                    "vcardArray": ["vcard", [
                        ["version", {}, "text", "4.0"],
                        ["fn", {}, "text", "Example Registrar Inc."]
                    ]]
                }
            ],
            "status": [
                "client delete prohibited",
                "clientTransferProhibited https://icann.org/epp#clientTransferProhibited"
            ],
            "events": [
                {"eventAction": "expiration", "eventDate": "2026-08-13T04:00:00Z"},
                {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"}
            ],
            "nameservers": [
                {"ldhName": "A.IANA-SERVERS.NET"},
                {"ldhName": "b.iana-servers.net"}
            ]
        });

        let record = parse_rdap_record(&json);
        assert_eq!(record.registrar.as_deref(), Some("Example Registrar Inc."));
        assert_eq!(
            record.statuses,
            vec!["clientDeleteProhibited", "clientTransferProhibited"]
        );
        assert_eq!(record.creation_date.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(
            record.nameservers,
            vec!["a.iana-servers.net", "b.iana-servers.net"]
        );
        assert_eq!(
            record.registrant_name.as_deref(),
            Some(NOT_AVAILABLE_VIA_RDAP)
        );
        assert_eq!(
            record.nexus_categories.as_deref(),
            Some(NOT_AVAILABLE_VIA_RDAP)
        );
    }

    #[test]
    fn test_missing_registrar_is_not_a_failure() {
        let json = serde_json::json!({
            "status": ["ok"],
            "events": []
        });

        let record = parse_rdap_record(&json);
        assert!(record.registrar.is_none());
        assert_eq!(record.statuses, vec!["ok"]);
        assert!(record.creation_date.is_none());
        assert!(record.nameservers.is_empty());
    }

    #[test]
    fn test_status_objects_with_type_key() {
        let json = serde_json::json!({
            "status": [{"type": "serverTransferProhibited"}, "clientHold"]
        });

        let record = parse_rdap_record(&json);
        assert_eq!(record.statuses, vec!["serverTransferProhibited", "clientHold"]);
    }

    #[test]
    fn test_registrar_falls_back_to_public_id() {
        let json = serde_json::json!({
            "entities": [{
                "roles": ["registrar"],
                "publicIds": [{"type": "IANA Registrar ID", "identifier": "376"}]
            }]
        });

        let record = parse_rdap_record(&json);
        assert_eq!(record.registrar.as_deref(), Some("376"));
    }

    #[test]
    fn test_extract_vcard_name() {
        let entity = serde_json::json!({
            "vcardArray": ["vcard", [["fn", {}, "text", "MarkMonitor Inc."]]]
        });
        assert_eq!(
            extract_vcard_name(&entity),
            Some("MarkMonitor Inc.".to_string())
        );
    }
}
