//! Core data types for bulk domain registration lookups.
//!
//! This module defines all the main data structures used throughout the library,
//! including the batch request, the normalized per-domain record, the outbound
//! result shape, the typed event stream items, and configuration options.

use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Sentinel emitted for fields the RDAP protocol never exposes
/// (registrant name, nexus categories).
pub const NOT_AVAILABLE_VIA_RDAP: &str = "Not available via RDAP";

/// Sentinel emitted when a requested field was simply absent from the
/// protocol response.
pub const NOT_FOUND: &str = "Not found";

/// Sentinel for the nexus field on WHOIS lookups outside the .us registry.
pub const NEXUS_NOT_APPLICABLE: &str = "N/A (not .US domain)";

/// The closed set of result fields a caller may request.
///
/// Unknown field keys fail request validation instead of silently passing
/// through — see [`crate::request::validate_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Domain,
    Registrar,
    RegistrantName,
    Statuses,
    CreationDate,
    NexusCategories,
    Nameservers,
}

impl Field {
    /// All valid field keys, in canonical order.
    pub const ALL: [Field; 7] = [
        Field::Domain,
        Field::Registrar,
        Field::RegistrantName,
        Field::Statuses,
        Field::CreationDate,
        Field::NexusCategories,
        Field::Nameservers,
    ];

    /// The wire name of this field key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Domain => "domain",
            Field::Registrar => "registrar",
            Field::RegistrantName => "registrant_name",
            Field::Statuses => "statuses",
            Field::CreationDate => "creation_date",
            Field::NexusCategories => "nexus_categories",
            Field::Nameservers => "nameservers",
        }
    }
}

impl FromStr for Field {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "domain" => Ok(Field::Domain),
            "registrar" => Ok(Field::Registrar),
            "registrant_name" => Ok(Field::RegistrantName),
            "statuses" => Ok(Field::Statuses),
            "creation_date" => Ok(Field::CreationDate),
            "nexus_categories" => Ok(Field::NexusCategories),
            "nameservers" => Ok(Field::Nameservers),
            other => Err(LookupError::invalid_request(format!(
                "Unknown field key: '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which protocol actually produced the data in a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LookupMethod {
    #[serde(rename = "RDAP")]
    Rdap,

    #[serde(rename = "WHOIS")]
    Whois,
}

impl std::fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupMethod::Rdap => write!(f, "RDAP"),
            LookupMethod::Whois => write!(f, "WHOIS"),
        }
    }
}

/// Raw batch request as received from the API/UI boundary, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLookupRequest {
    /// Raw input strings, one per domain; may contain blanks and duplicates
    pub domains: Vec<String>,

    /// Requested field keys as free strings
    pub fields: Vec<String>,

    /// RDAP-first-with-WHOIS-fallback mode (true) vs WHOIS-only mode (false)
    pub use_rdap: bool,
}

/// A validated batch request, ready for the streamer.
///
/// Produced only by [`crate::request::validate_request`]: domains are
/// trimmed, lowercased, deduplicated preserving first occurrence, and
/// within the configured ceiling; fields are parsed into the closed enum.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub domains: Vec<String>,
    pub fields: Vec<Field>,
    pub use_rdap: bool,
}

/// Normalized registration data as parsed from either protocol.
///
/// Internal to the pipeline — the outbound [`DomainResult`] is a projection
/// of this record onto the requested field set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainRecord {
    pub registrar: Option<String>,
    pub registrant_name: Option<String>,
    /// Plain EPP status tokens, order-preserving, duplicates removed
    pub statuses: Vec<String>,
    pub creation_date: Option<String>,
    pub nexus_categories: Option<String>,
    /// Lowercase nameserver hostnames
    pub nameservers: Vec<String>,
}

/// Outbound per-domain result, carrying only the requested fields.
///
/// Exactly one of these is emitted per deduplicated input domain. On
/// success `_method` names the protocol whose data populated the record;
/// when both protocols failed, `error` carries the reason and no data
/// fields are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainResult {
    /// The normalized (lowercased) domain this result belongs to
    pub domain: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nexus_categories: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,

    /// Protocol that produced the data; absent on failed lookups
    #[serde(rename = "_method", skip_serializing_if = "Option::is_none")]
    pub method: Option<LookupMethod>,

    /// Failure reason when both protocols failed for this domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DomainResult {
    /// Project a parsed record onto the requested field set.
    ///
    /// Requested fields missing from the record are filled with the
    /// [`NOT_FOUND`] sentinel rather than omitted, so the caller can tell
    /// "not requested" apart from "requested but absent upstream".
    pub fn from_record(
        domain: &str,
        record: &DomainRecord,
        fields: &[Field],
        method: LookupMethod,
    ) -> Self {
        let mut result = Self::empty(domain);
        result.method = Some(method);

        for field in fields {
            match field {
                Field::Domain => {} // always present as the key
                Field::Registrar => {
                    result.registrar =
                        Some(record.registrar.clone().unwrap_or_else(|| NOT_FOUND.into()));
                }
                Field::RegistrantName => {
                    result.registrant_name = Some(
                        record
                            .registrant_name
                            .clone()
                            .unwrap_or_else(|| NOT_FOUND.into()),
                    );
                }
                Field::Statuses => {
                    result.statuses = Some(record.statuses.clone());
                }
                Field::CreationDate => {
                    result.creation_date = Some(
                        record
                            .creation_date
                            .clone()
                            .unwrap_or_else(|| NOT_FOUND.into()),
                    );
                }
                Field::NexusCategories => {
                    result.nexus_categories = Some(
                        record
                            .nexus_categories
                            .clone()
                            .unwrap_or_else(|| NOT_FOUND.into()),
                    );
                }
                Field::Nameservers => {
                    result.nameservers = Some(record.nameservers.clone());
                }
            }
        }

        result
    }

    /// Build the error payload for a domain whose every attempt failed.
    pub fn failed<D: Into<String>, E: Into<String>>(domain: D, error: E) -> Self {
        let mut result = Self::empty(&domain.into());
        result.error = Some(error.into());
        result
    }

    fn empty(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            registrar: None,
            registrant_name: None,
            statuses: None,
            creation_date: None,
            nexus_categories: None,
            nameservers: None,
            method: None,
            error: None,
        }
    }

    /// Whether this result is a per-domain failure payload.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Typed events produced by the batch streamer, in emission order:
/// one `total`, zero or more `message`/`keep_alive`, then exactly one
/// `result` per deduplicated domain in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LookupEvent {
    /// Deduplicated domain count, emitted once before any result
    Total { total: usize },

    /// Free-text informational event
    Message { message: String },

    /// One per domain, success or per-domain error payload
    Result(DomainResult),

    /// Idle heartbeat so intermediaries keep the connection open
    KeepAlive,
}

impl LookupEvent {
    /// The wire name of this event type.
    pub fn event_name(&self) -> &'static str {
        match self {
            LookupEvent::Total { .. } => "total",
            LookupEvent::Message { .. } => "message",
            LookupEvent::Result(_) => "result",
            LookupEvent::KeepAlive => "keep_alive",
        }
    }
}

/// Configuration options for lookup operations.
///
/// This struct allows fine-tuning of the pipeline's behavior, including
/// concurrency, per-protocol timeouts, and the batch ceiling.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Maximum number of concurrent per-domain lookups
    /// Default: 10, Range: 1-100
    pub concurrency: usize,

    /// Ceiling on deduplicated domain count per batch; larger batches are
    /// rejected wholesale before any network I/O
    /// Default: 500
    pub max_domains: usize,

    /// Timeout for a single RDAP query
    /// Default: 10 seconds
    pub rdap_timeout: Duration,

    /// Timeout for a single WHOIS query
    /// Default: 10 seconds
    pub whois_timeout: Duration,

    /// Whether RDAP failures fall back to WHOIS (only relevant when the
    /// request selects RDAP-first mode)
    /// Default: true
    pub enable_whois_fallback: bool,

    /// How long a fetched bootstrap registry snapshot stays fresh
    /// Default: 24 hours
    pub bootstrap_ttl: Duration,

    /// IANA bootstrap discovery document URL (overridable for tests)
    pub bootstrap_url: String,

    /// Emit a keep-alive event when no result completed within this interval
    /// Default: 10 seconds
    pub keepalive_interval: Duration,
}

impl Default for LookupConfig {
    /// Create a sensible default configuration.
    ///
    /// These defaults are chosen to work well for most use cases
    /// while being conservative about upstream registry load.
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_domains: 500,
            rdap_timeout: Duration::from_secs(10),
            whois_timeout: Duration::from_secs(10),
            enable_whois_fallback: true,
            bootstrap_ttl: Duration::from_secs(24 * 3600),
            bootstrap_url: "https://data.iana.org/rdap/dns.json".to_string(),
            keepalive_interval: Duration::from_secs(10),
        }
    }
}

impl LookupConfig {
    /// Set custom concurrency.
    ///
    /// Automatically caps concurrency at 100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the batch domain ceiling.
    pub fn with_max_domains(mut self, max_domains: usize) -> Self {
        self.max_domains = max_domains.max(1);
        self
    }

    /// Set the per-call RDAP timeout.
    pub fn with_rdap_timeout(mut self, timeout: Duration) -> Self {
        self.rdap_timeout = timeout;
        self
    }

    /// Set the per-call WHOIS timeout.
    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    /// Enable or disable WHOIS fallback after RDAP failures.
    pub fn with_whois_fallback(mut self, enabled: bool) -> Self {
        self.enable_whois_fallback = enabled;
        self
    }

    /// Override the bootstrap discovery document URL.
    pub fn with_bootstrap_url<U: Into<String>>(mut self, url: U) -> Self {
        self.bootstrap_url = url.into();
        self
    }

    /// Set the idle keep-alive interval.
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }
}
