//! WHOIS protocol client.
//!
//! Uses the system's `whois` command to obtain free-text registry output,
//! then parses known label patterns into the same normalized record shape
//! the RDAP client produces. The `.us` registry's generic output routinely
//! omits registrant and nexus data, so a direct query against the registry's
//! own WHOIS service backfills those fields when they are missing.

use crate::error::LookupError;
use crate::normalize::normalize_statuses;
use crate::types::{DomainRecord, NEXUS_NOT_APPLICABLE};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// The .us registry's own WHOIS service, used for the direct-query path.
const US_REGISTRY_WHOIS: &str = "whois.nic.us";

lazy_static! {
    /// Dotted/slashed dates like `2001.11.07` or `2001/11/07`
    static ref SLOPPY_ISO_DATE: Regex = Regex::new(r"^(\d{4})[./](\d{2})[./](\d{2})$").unwrap();
}

/// WHOIS client for querying registration data via the system `whois` tool.
#[derive(Clone)]
pub struct WhoisClient {
    /// Timeout for a single WHOIS query
    timeout: Duration,
}

impl WhoisClient {
    /// Create a new WHOIS client with the given per-query timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Query registration data for one domain via WHOIS.
    ///
    /// Runs the generic query first; for `.us` domains whose generic output
    /// is missing registrant or nexus data, a direct query against the
    /// registry's own service fills the gaps without overwriting fields the
    /// generic parse already populated.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::WhoisError` if the domain is reported as
    /// nonexistent, the output contains no recognizable registration data,
    /// or the `whois` command cannot be executed. For `.us` domains the
    /// direct path must fail too before the call fails as a whole.
    pub async fn query_domain(&self, domain: &str) -> Result<DomainRecord, LookupError> {
        let is_us = domain.to_lowercase().ends_with(".us");

        let generic = self.query_and_parse(domain, None).await;

        let mut record = match generic {
            Ok(record) => record,
            Err(err) if is_us && !err.is_not_found() => {
                // Generic path dead; the registry's own service may still answer
                debug!(domain, error = %err, "generic WHOIS failed, trying .us registry directly");
                return self.query_and_parse(domain, Some(US_REGISTRY_WHOIS)).await;
            }
            Err(err) => return Err(err),
        };

        if is_us {
            if record.registrant_name.is_none() || record.nexus_categories.is_none() {
                // Common gap in generic .us output; consult the registry directly
                // and merge without overwriting what we already have.
                match self.query_and_parse(domain, Some(US_REGISTRY_WHOIS)).await {
                    Ok(direct) => {
                        if record.registrant_name.is_none() {
                            record.registrant_name = direct.registrant_name;
                        }
                        if record.nexus_categories.is_none() {
                            record.nexus_categories = direct.nexus_categories;
                        }
                    }
                    Err(err) => {
                        debug!(domain, error = %err, "direct .us WHOIS query failed, keeping generic record");
                    }
                }
            }
        } else {
            record.nexus_categories = Some(NEXUS_NOT_APPLICABLE.to_string());
        }

        Ok(record)
    }

    async fn query_and_parse(
        &self,
        domain: &str,
        server: Option<&str>,
    ) -> Result<DomainRecord, LookupError> {
        let output = self.bounded(self.execute_whois(domain, server)).await?;
        let lower = output.to_lowercase();

        if is_rate_limited(&lower) {
            // One retry after a short pause; registries throttle aggressively
            tokio::time::sleep(Duration::from_millis(1000)).await;
            let retry = self.bounded(self.execute_whois(domain, server)).await?;
            return self.parse_output(domain, &retry);
        }

        self.parse_output(domain, &output)
    }

    /// Run one WHOIS invocation under the per-query timeout. Every attempt,
    /// including the rate-limit retry, goes through here so a hung registry
    /// can never stall a worker past the configured bound.
    async fn bounded<F>(&self, query: F) -> Result<String, LookupError>
    where
        F: std::future::Future<Output = Result<String, LookupError>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::timeout("WHOIS query", self.timeout)),
        }
    }

    fn parse_output(&self, domain: &str, output: &str) -> Result<DomainRecord, LookupError> {
        let lower = output.to_lowercase();

        if indicates_not_found(&lower) {
            return Err(LookupError::whois(domain, "Domain not found in registry"));
        }

        let record = parse_whois_record(output);
        if record == DomainRecord::default() {
            return Err(LookupError::whois(
                domain,
                "No recognizable registration data in WHOIS response",
            ));
        }

        Ok(record)
    }

    async fn execute_whois(
        &self,
        domain: &str,
        server: Option<&str>,
    ) -> Result<String, LookupError> {
        let mut command = Command::new("whois");
        if let Some(server) = server {
            command.arg("-h").arg(server);
        }

        let output = command.arg(domain).output().await.map_err(|e| {
            LookupError::whois(
                domain,
                format!(
                    "Failed to execute whois command: {}. Make sure 'whois' is installed.",
                    e
                ),
            )
        })?;

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Parse free-text WHOIS output into a normalized record.
///
/// Matches the well-known label patterns (Registrar, Registrant Name,
/// Domain Status, Creation Date, Name Server, plus the `.us` registry's
/// Application Purpose / Nexus Category labels) on a line-by-line basis.
/// First occurrence wins for scalar fields; list fields accumulate.
pub fn parse_whois_record(output: &str) -> DomainRecord {
    let mut record = DomainRecord::default();
    let mut raw_statuses: Vec<String> = Vec::new();
    let mut application_purpose: Option<String> = None;
    let mut nexus_category: Option<String> = None;

    for line in output.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let label = label.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match label.as_str() {
            "registrar" => {
                if record.registrar.is_none() {
                    record.registrar = Some(value.to_string());
                }
            }
            "registrant name" | "registrant" => {
                if record.registrant_name.is_none() {
                    record.registrant_name = Some(value.to_string());
                }
            }
            "domain status" | "status" => {
                raw_statuses.push(value.to_string());
            }
            "creation date" | "created" | "created on" | "registered on" | "registration date" => {
                if record.creation_date.is_none() {
                    record.creation_date = Some(normalize_creation_date(value));
                }
            }
            "name server" | "nameserver" | "nameservers" => {
                // Some registries append the server's IP after the hostname
                if let Some(host) = value.split_whitespace().next() {
                    let host = host.to_lowercase();
                    if !record.nameservers.contains(&host) {
                        record.nameservers.push(host);
                    }
                }
            }
            "registrant application purpose" | "application purpose" => {
                if application_purpose.is_none() {
                    application_purpose = Some(value.to_string());
                }
            }
            "registrant nexus category" | "nexus category" => {
                if nexus_category.is_none() {
                    nexus_category = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    record.statuses = normalize_statuses(raw_statuses);
    record.nexus_categories = compose_nexus(application_purpose, nexus_category);

    record
}

/// Fold the `.us` purpose and nexus labels into one display string.
fn compose_nexus(purpose: Option<String>, category: Option<String>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(purpose) = purpose {
        parts.push(format!("Application Purpose: {}", purpose));
    }
    if let Some(category) = category {
        parts.push(format!("Nexus Category: {}", category));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// Keep ISO-8601-looking dates as-is, repair dotted/slashed variants,
/// and pass anything else through verbatim.
fn normalize_creation_date(value: &str) -> String {
    let value = value.trim();
    if let Some(captures) = SLOPPY_ISO_DATE.captures(value) {
        return format!("{}-{}-{}", &captures[1], &captures[2], &captures[3]);
    }
    value.to_string()
}

/// Patterns registries use to report a nonexistent domain.
fn indicates_not_found(lower_output: &str) -> bool {
    const NOT_FOUND_PATTERNS: [&str; 7] = [
        "no match for",
        "domain not found",
        "no data found",
        "no entries found",
        "the queried object does not exist",
        "domain status: no object found",
        "this domain name has not been registered",
    ];

    NOT_FOUND_PATTERNS
        .iter()
        .any(|pattern| lower_output.contains(pattern))
}

/// Patterns registries use when throttling a client.
fn is_rate_limited(lower_output: &str) -> bool {
    const RATE_LIMIT_PATTERNS: [&str; 6] = [
        "rate limit exceeded",
        "too many requests",
        "quota exceeded",
        "limit exceeded",
        "try again later",
        "rate-limited",
    ];

    RATE_LIMIT_PATTERNS
        .iter()
        .any(|pattern| lower_output.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERIC_OUTPUT: &str = "\
Domain Name: EXAMPLE.COM
Registry Domain ID: 2336799_DOMAIN_COM-VRSN
Registrar: RESERVED-Internet Assigned Numbers Authority
Updated Date: 2025-08-14T07:01:34Z
Creation Date: 1995-08-14T04:00:00Z
Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
Name Server: A.IANA-SERVERS.NET
Name Server: B.IANA-SERVERS.NET
Registrant Name: Internet Assigned Numbers Authority
";

    const US_DIRECT_OUTPUT: &str = "\
Domain Name: example.us
Registrant Name: Jane Operator
Registrant Application Purpose: P1
Registrant Nexus Category: C21
Domain Status: ok
";

    #[test]
    fn test_parse_generic_output() {
        let record = parse_whois_record(GENERIC_OUTPUT);
        assert_eq!(
            record.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(
            record.registrant_name.as_deref(),
            Some("Internet Assigned Numbers Authority")
        );
        assert_eq!(
            record.statuses,
            vec!["clientDeleteProhibited", "clientTransferProhibited"]
        );
        assert_eq!(record.creation_date.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(
            record.nameservers,
            vec!["a.iana-servers.net", "b.iana-servers.net"]
        );
        assert!(record.nexus_categories.is_none());
    }

    #[test]
    fn test_parse_us_direct_output() {
        let record = parse_whois_record(US_DIRECT_OUTPUT);
        assert_eq!(record.registrant_name.as_deref(), Some("Jane Operator"));
        assert_eq!(
            record.nexus_categories.as_deref(),
            Some("Application Purpose: P1; Nexus Category: C21")
        );
        assert_eq!(record.statuses, vec!["ok"]);
    }

    #[test]
    fn test_nexus_with_only_category() {
        let record = parse_whois_record("Registrant Nexus Category: C11\nRegistrar: X\n");
        assert_eq!(
            record.nexus_categories.as_deref(),
            Some("Nexus Category: C11")
        );
    }

    #[test]
    fn test_not_found_patterns() {
        assert!(indicates_not_found("no match for \"surely-free.com\"."));
        assert!(indicates_not_found("domain not found"));
        assert!(indicates_not_found("the queried object does not exist: whatever"));
        assert!(!indicates_not_found("registrar: example registrar"));
    }

    #[test]
    fn test_rate_limit_patterns() {
        assert!(is_rate_limited("rate limit exceeded. try again later."));
        assert!(is_rate_limited("too many requests from your ip"));
        assert!(!is_rate_limited("normal whois response"));
    }

    #[test]
    fn test_creation_date_repair_and_passthrough() {
        assert_eq!(normalize_creation_date("2001.11.07"), "2001-11-07");
        assert_eq!(normalize_creation_date("2001/11/07"), "2001-11-07");
        assert_eq!(
            normalize_creation_date("2001-11-07T00:00:00Z"),
            "2001-11-07T00:00:00Z"
        );
        // Not parseable as ISO: emitted verbatim
        assert_eq!(normalize_creation_date("07-nov-2001"), "07-nov-2001");
    }

    #[test]
    fn test_nameserver_ip_suffix_stripped() {
        let record = parse_whois_record("Name Server: NS1.EXAMPLE.NET 192.0.2.1\n");
        assert_eq!(record.nameservers, vec!["ns1.example.net"]);
    }

    #[test]
    fn test_unparseable_output_rejected() {
        let client = WhoisClient::new(Duration::from_secs(5));
        let err = client
            .parse_output("example.com", ">>> some banner with no labels <<<")
            .unwrap_err();
        assert!(matches!(err, LookupError::WhoisError { .. }));
    }

    #[tokio::test]
    async fn test_bounded_cuts_off_hung_queries() {
        let client = WhoisClient::new(Duration::from_millis(20));
        let err = client
            .bounded(std::future::pending::<Result<String, LookupError>>())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Timeout { .. }));
    }

    #[test]
    fn test_first_occurrence_wins_for_scalars() {
        let output = "Registrar: First Registrar\nRegistrar: Second Registrar\n";
        let record = parse_whois_record(output);
        assert_eq!(record.registrar.as_deref(), Some("First Registrar"));
    }
}
