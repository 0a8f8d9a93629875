//! IANA bootstrap registry: TLD -> authoritative RDAP base URL.
//!
//! The registry is explicit, injected state rather than a global singleton:
//! the orchestrator holds an `Arc<BootstrapRegistry>` shared by every
//! concurrent lookup. The suffix map is refreshed on a TTL by swapping the
//! whole snapshot under a write lock, so concurrent readers never observe
//! a half-updated map. Tests inject a static map and never touch the network.

use crate::error::LookupError;
use crate::types::LookupConfig;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a failed discovery fetch suppresses further fetch attempts.
/// While the window is open every resolve answers `BootstrapError`
/// immediately instead of queueing behind another doomed fetch.
const REFRESH_BACKOFF: Duration = Duration::from_secs(30);

/// One immutable generation of the suffix map. Replaced wholesale on refresh.
struct Snapshot {
    /// TLD -> RDAP service base URL (trailing slash stripped)
    endpoints: HashMap<String, String>,
    /// When this snapshot was fetched; None means never fetched
    fetched_at: Option<Instant>,
    /// When the last fetch attempt failed; None means no recent failure
    failed_at: Option<Instant>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            endpoints: HashMap::new(),
            fetched_at: None,
            failed_at: None,
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        match self.fetched_at {
            Some(t) => t.elapsed() > ttl,
            None => true,
        }
    }

    fn in_backoff(&self) -> bool {
        matches!(self.failed_at, Some(t) if t.elapsed() < REFRESH_BACKOFF)
    }
}

/// Process-scoped cache of the IANA RDAP bootstrap document.
pub struct BootstrapRegistry {
    http: reqwest::Client,
    url: String,
    ttl: Duration,
    snapshot: RwLock<Snapshot>,
    /// Serializes refreshes so a stale cache triggers one fetch, not a stampede
    refresh_guard: tokio::sync::Mutex<()>,
}

impl BootstrapRegistry {
    /// Create a registry that fetches the discovery document on first use.
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                LookupError::network_with_source(
                    "Failed to create bootstrap HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http,
            url: config.bootstrap_url.clone(),
            ttl: config.bootstrap_ttl,
            snapshot: RwLock::new(Snapshot::empty()),
            refresh_guard: tokio::sync::Mutex::new(()),
        })
    }

    /// Create a registry backed by a fixed suffix map that never refreshes.
    ///
    /// Intended for tests: the orchestrator can be exercised without any
    /// network access by injecting the mapping directly.
    pub fn with_static_map(endpoints: HashMap<String, String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: String::new(),
            // Effectively never stale
            ttl: Duration::from_secs(u64::MAX / 4),
            snapshot: RwLock::new(Snapshot {
                endpoints,
                fetched_at: Some(Instant::now()),
                failed_at: None,
            }),
            refresh_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Resolve a TLD to its authoritative RDAP base URL.
    ///
    /// Fresh snapshots answer from memory; a stale or empty snapshot
    /// triggers one fetch of the discovery document. A fetch failure
    /// degrades to `BootstrapError` for the queried TLD and opens a
    /// backoff window during which no further fetches are attempted, so
    /// a dead discovery endpoint fails every lookup fast instead of
    /// queueing them behind repeated doomed fetches. Never aborts the
    /// batch.
    pub async fn resolve(&self, tld: &str) -> Result<String, LookupError> {
        let tld = tld.to_lowercase();

        {
            let snapshot = self
                .snapshot
                .read()
                .map_err(|_| LookupError::internal("Bootstrap snapshot lock poisoned"))?;
            if !snapshot.is_stale(self.ttl) {
                return match snapshot.endpoints.get(&tld) {
                    Some(base) => Ok(base.clone()),
                    None => Err(LookupError::bootstrap(
                        &tld,
                        "No RDAP service registered for this TLD",
                    )),
                };
            }
            if snapshot.in_backoff() {
                return Err(LookupError::bootstrap(
                    &tld,
                    "Bootstrap document unreachable, backing off before retrying",
                ));
            }
        }

        self.refresh().await?;

        let snapshot = self
            .snapshot
            .read()
            .map_err(|_| LookupError::internal("Bootstrap snapshot lock poisoned"))?;
        snapshot.endpoints.get(&tld).cloned().ok_or_else(|| {
            LookupError::bootstrap(&tld, "No RDAP service registered for this TLD")
        })
    }

    /// Fetch the discovery document and swap in a fresh snapshot.
    ///
    /// Safe to call concurrently: one caller fetches, the rest wait and
    /// reuse its result. A failed fetch is recorded in the snapshot so
    /// callers answer from the backoff window instead of re-fetching.
    async fn refresh(&self) -> Result<(), LookupError> {
        let _guard = self.refresh_guard.lock().await;

        // Another caller may have refreshed (or failed) while we waited
        {
            let snapshot = self
                .snapshot
                .read()
                .map_err(|_| LookupError::internal("Bootstrap snapshot lock poisoned"))?;
            if !snapshot.is_stale(self.ttl) {
                return Ok(());
            }
            if snapshot.in_backoff() {
                return Err(LookupError::bootstrap(
                    "*",
                    "Bootstrap document unreachable, backing off before retrying",
                ));
            }
        }

        match self.fetch_endpoints().await {
            Ok(endpoints) => {
                debug!(tld_count = endpoints.len(), "bootstrap snapshot refreshed");
                let mut snapshot = self
                    .snapshot
                    .write()
                    .map_err(|_| LookupError::internal("Bootstrap snapshot lock poisoned"))?;
                *snapshot = Snapshot {
                    endpoints,
                    fetched_at: Some(Instant::now()),
                    failed_at: None,
                };
                Ok(())
            }
            Err(err) => {
                if let Ok(mut snapshot) = self.snapshot.write() {
                    snapshot.failed_at = Some(Instant::now());
                }
                Err(err)
            }
        }
    }

    async fn fetch_endpoints(&self) -> Result<HashMap<String, String>, LookupError> {
        debug!(url = %self.url, "fetching RDAP bootstrap document");

        let response = self.http.get(&self.url).send().await.map_err(|e| {
            warn!(error = %e, "bootstrap document fetch failed");
            LookupError::bootstrap("*", format!("Failed to fetch bootstrap document: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(LookupError::bootstrap(
                "*",
                format!("Bootstrap document returned HTTP {}", response.status()),
            ));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            LookupError::bootstrap("*", format!("Failed to parse bootstrap JSON: {}", e))
        })?;

        parse_bootstrap_document(&json)
    }
}

/// Parse the IANA bootstrap document's `services` array into a TLD map.
///
/// Each service entry is `[[tld, ...], [url, ...]]`; the first URL wins.
fn parse_bootstrap_document(
    json: &serde_json::Value,
) -> Result<HashMap<String, String>, LookupError> {
    let services = json
        .get("services")
        .and_then(|s| s.as_array())
        .ok_or_else(|| {
            LookupError::bootstrap(
                "*",
                "Invalid bootstrap JSON: missing or invalid 'services' array",
            )
        })?;

    let mut endpoints = HashMap::new();

    for service in services {
        let Some(entry) = service.as_array() else {
            continue;
        };
        if entry.len() < 2 {
            continue;
        }

        let url = entry[1]
            .as_array()
            .and_then(|urls| urls.first())
            .and_then(|u| u.as_str());

        if let Some(url) = url {
            let base = url.trim_end_matches('/').to_string();
            if let Some(tlds) = entry[0].as_array() {
                for tld in tlds {
                    if let Some(tld) = tld.as_str() {
                        endpoints.insert(tld.to_lowercase(), base.clone());
                    }
                }
            }
        }
    }

    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bootstrap_document() {
        let json = serde_json::json!({
            "version": "1.0",
            "services": [
                [["com", "net"], ["https://rdap.verisign.com/com/v1/"]],
                [["US"], ["https://rdap.nic.us/", "https://backup.rdap.nic.us/"]],
                [["broken"], []]
            ]
        });

        let endpoints = parse_bootstrap_document(&json).unwrap();
        assert_eq!(
            endpoints.get("com").map(String::as_str),
            Some("https://rdap.verisign.com/com/v1")
        );
        assert_eq!(endpoints.get("net"), endpoints.get("com"));
        // TLD keys lowercased, first URL wins
        assert_eq!(
            endpoints.get("us").map(String::as_str),
            Some("https://rdap.nic.us")
        );
        assert!(!endpoints.contains_key("broken"));
    }

    #[test]
    fn test_parse_rejects_missing_services() {
        let json = serde_json::json!({"version": "1.0"});
        assert!(parse_bootstrap_document(&json).is_err());
    }

    #[tokio::test]
    async fn test_static_map_resolve() {
        let mut map = HashMap::new();
        map.insert("com".to_string(), "https://rdap.example.test".to_string());
        let registry = BootstrapRegistry::with_static_map(map);

        let base = registry.resolve("com").await.unwrap();
        assert_eq!(base, "https://rdap.example.test");

        // Case-insensitive on the caller side
        assert!(registry.resolve("COM").await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_fetch_opens_backoff_window() {
        // Nothing listens on the discard port, so the fetch fails
        // immediately with a connection error
        let config = LookupConfig::default().with_bootstrap_url("http://127.0.0.1:9");
        let registry = BootstrapRegistry::new(&config).unwrap();

        let first = registry.resolve("com").await.unwrap_err();
        assert!(matches!(first, LookupError::BootstrapError { .. }));

        // Subsequent resolves answer from the backoff window without
        // attempting another fetch
        let second = registry.resolve("com").await.unwrap_err();
        assert!(second.to_string().contains("backing off"));
        assert!(second.triggers_fallback());
    }

    #[tokio::test]
    async fn test_static_map_miss_is_bootstrap_error() {
        let registry = BootstrapRegistry::with_static_map(HashMap::new());
        let err = registry.resolve("zz").await.unwrap_err();
        assert!(matches!(err, LookupError::BootstrapError { .. }));
        assert!(err.triggers_fallback());
    }
}
