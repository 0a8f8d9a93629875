//! Protocol implementations for domain registration lookups.
//!
//! This module contains the protocol-specific clients:
//! - `bootstrap`: IANA bootstrap registry (TLD -> RDAP base URL)
//! - `rdap`: RDAP protocol client (structured JSON over HTTPS)
//! - `whois`: WHOIS protocol client (legacy free-text), including the
//!   direct-registry path for `.us` domains

pub mod bootstrap;
pub mod rdap;
pub mod whois;

pub use bootstrap::BootstrapRegistry;
pub use rdap::RdapClient;
pub use whois::WhoisClient;

use crate::error::LookupError;

/// Extract the TLD from a domain name.
///
/// The bootstrap authority publishes its RDAP map at TLD granularity, so
/// a simple last-label split is sufficient (no public-suffix handling).
pub fn extract_tld(domain: &str) -> Result<String, LookupError> {
    let parts: Vec<&str> = domain.split('.').collect();

    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(LookupError::invalid_request(format!(
            "'{}' is not a valid domain name",
            domain
        )));
    }

    Ok(parts.last().unwrap().to_lowercase())
}
