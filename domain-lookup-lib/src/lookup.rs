//! Per-domain lookup orchestration.
//!
//! One `LookupOrchestrator` coordinates both protocol clients over a shared
//! bootstrap registry and runs the per-domain state machine:
//!
//! ```text
//! Start -> TryRdap (if use_rdap) -> Done(RDAP record)
//!                                -> Fail (terminal: domain not found)
//!                                -> TryWhois (transient failure, fallback on)
//!       -> TryWhois (WHOIS-only mode) -> Done(WHOIS record) / Fail
//! ```
//!
//! `Fail` is a per-domain error payload, never a batch abort: every input
//! domain yields exactly one [`DomainResult`].

use crate::error::LookupError;
use crate::protocols::{BootstrapRegistry, RdapClient, WhoisClient};
use crate::types::{DomainResult, Field, LookupConfig, LookupMethod};
use std::sync::Arc;
use tracing::debug;

/// Coordinates protocol selection, fallback, and result projection for
/// individual domains.
#[derive(Clone)]
pub struct LookupOrchestrator {
    config: LookupConfig,
    rdap: RdapClient,
    whois: WhoisClient,
}

impl LookupOrchestrator {
    /// Create an orchestrator with a fresh bootstrap registry.
    pub fn new(config: LookupConfig) -> Result<Self, LookupError> {
        let registry = Arc::new(BootstrapRegistry::new(&config)?);
        Self::with_registry(config, registry)
    }

    /// Create an orchestrator over an existing registry.
    ///
    /// This is the injection seam: tests pass a registry built from a
    /// static map so the RDAP path can be exercised without the network.
    pub fn with_registry(
        config: LookupConfig,
        registry: Arc<BootstrapRegistry>,
    ) -> Result<Self, LookupError> {
        let rdap = RdapClient::new(config.rdap_timeout, registry)?;
        let whois = WhoisClient::new(config.whois_timeout);

        Ok(Self {
            config,
            rdap,
            whois,
        })
    }

    /// The configuration this orchestrator was built with.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Resolve one domain into exactly one result.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// per-domain error payload so the batch stream always completes.
    pub async fn lookup_domain(
        &self,
        domain: &str,
        use_rdap: bool,
        fields: &[Field],
    ) -> DomainResult {
        if !use_rdap {
            // WHOIS-only mode skips straight to TryWhois
            return self.try_whois(domain, fields, None).await;
        }

        match self.rdap.query_domain(domain).await {
            Ok(record) => {
                debug!(domain, "RDAP lookup succeeded");
                DomainResult::from_record(domain, &record, fields, LookupMethod::Rdap)
            }
            Err(err) if err.is_not_found() => {
                // WHOIS would report nonexistence too; don't waste the query
                debug!(domain, "domain not found via RDAP, terminal");
                DomainResult::failed(domain, err.to_string())
            }
            Err(err) if self.config.enable_whois_fallback && err.triggers_fallback() => {
                debug!(domain, error = %err, "RDAP failed, falling back to WHOIS");
                self.try_whois(domain, fields, Some(err)).await
            }
            Err(err) => DomainResult::failed(domain, err.to_string()),
        }
    }

    async fn try_whois(
        &self,
        domain: &str,
        fields: &[Field],
        rdap_failure: Option<LookupError>,
    ) -> DomainResult {
        match self.whois.query_domain(domain).await {
            Ok(record) => {
                debug!(domain, "WHOIS lookup succeeded");
                DomainResult::from_record(domain, &record, fields, LookupMethod::Whois)
            }
            Err(whois_err) => {
                let reason = match rdap_failure {
                    Some(rdap_err) => format!("{}; {}", rdap_err, whois_err),
                    None => whois_err.to_string(),
                };
                debug!(domain, reason = %reason, "all lookup attempts failed");
                DomainResult::failed(domain, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NOT_FOUND;
    use std::collections::HashMap;
    use std::time::Duration;

    fn orchestrator_with_empty_registry(fallback: bool) -> LookupOrchestrator {
        let config = LookupConfig::default()
            .with_whois_fallback(fallback)
            .with_whois_timeout(Duration::from_millis(50));
        let registry = Arc::new(BootstrapRegistry::with_static_map(HashMap::new()));
        LookupOrchestrator::with_registry(config, registry).unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_miss_without_fallback_is_per_domain_error() {
        let orchestrator = orchestrator_with_empty_registry(false);
        let result = orchestrator
            .lookup_domain("example.nowhere", true, &[Field::Domain])
            .await;

        assert!(result.is_error());
        assert_eq!(result.domain, "example.nowhere");
        assert!(result.method.is_none());
        assert!(result.error.as_deref().unwrap().contains("Bootstrap"));
    }

    #[tokio::test]
    async fn test_transient_rdap_failure_falls_back_to_whois() {
        // Empty bootstrap map: the RDAP attempt fails with a bootstrap
        // miss, which is transient, so WHOIS must be attempted before the
        // domain is reported as failed. The local whois invocation fails
        // on its own (unknown TLD or short timeout) without network.
        let orchestrator = orchestrator_with_empty_registry(true);
        let result = orchestrator
            .lookup_domain("example.nowhere", true, &[Field::Domain, Field::Registrar])
            .await;

        assert!(result.is_error());
        let reason = result.error.unwrap();
        // Both attempts are named in the combined reason, proving the
        // fallback ran exactly once after the RDAP failure
        assert!(reason.contains("Bootstrap"), "reason: {}", reason);
        assert!(reason.contains("WHOIS"), "reason: {}", reason);
    }

    #[tokio::test]
    async fn test_invalid_domain_never_panics() {
        let orchestrator = orchestrator_with_empty_registry(false);
        let result = orchestrator
            .lookup_domain("no-dots", true, &[Field::Domain, Field::Registrar])
            .await;

        assert!(result.is_error());
        // Error payloads carry no data fields
        assert!(result.registrar.is_none());
    }

    #[test]
    fn test_error_result_shape_matches_contract() {
        let result = DomainResult::failed("x.com", "RDAP error; WHOIS error");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["domain"], "x.com");
        assert_eq!(json["error"], "RDAP error; WHOIS error");
        assert!(json.get("registrar").is_none());
        assert!(json.get("_method").is_none());
        // NOT_FOUND sentinel is reserved for successful lookups
        assert_ne!(json["error"], NOT_FOUND);
    }
}
