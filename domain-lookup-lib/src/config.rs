//! Environment-based configuration overrides.
//!
//! Every tunable in [`LookupConfig`] can be overridden with a `DL_*`
//! environment variable. Invalid values are logged and ignored rather than
//! failing startup, so a typo in one variable never takes the whole
//! pipeline down.

use crate::types::LookupConfig;
use std::env;
use std::time::Duration;
use tracing::warn;

/// Configuration values read from `DL_*` environment variables.
///
/// `None` means the variable was unset or invalid; [`EnvConfig::apply`]
/// only touches settings that parsed successfully.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub max_domains: Option<usize>,
    pub rdap_timeout: Option<Duration>,
    pub whois_timeout: Option<Duration>,
    pub keepalive_interval: Option<Duration>,
    pub whois_fallback: Option<bool>,
    pub bootstrap_url: Option<String>,
}

impl EnvConfig {
    /// Layer these overrides onto a base configuration.
    pub fn apply(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(max_domains) = self.max_domains {
            config = config.with_max_domains(max_domains);
        }
        if let Some(timeout) = self.rdap_timeout {
            config = config.with_rdap_timeout(timeout);
        }
        if let Some(timeout) = self.whois_timeout {
            config = config.with_whois_timeout(timeout);
        }
        if let Some(interval) = self.keepalive_interval {
            config = config.with_keepalive_interval(interval);
        }
        if let Some(enabled) = self.whois_fallback {
            config = config.with_whois_fallback(enabled);
        }
        if let Some(url) = &self.bootstrap_url {
            config = config.with_bootstrap_url(url.clone());
        }
        config
    }
}

/// Read `DL_*` environment variables into an [`EnvConfig`].
///
/// Recognized variables:
/// - `DL_CONCURRENCY` — concurrent lookups, 1-100
/// - `DL_MAX_DOMAINS` — per-batch domain ceiling
/// - `DL_RDAP_TIMEOUT` — per-query RDAP timeout, e.g. `10s` or `2m`
/// - `DL_WHOIS_TIMEOUT` — per-query WHOIS timeout
/// - `DL_KEEPALIVE` — idle keep-alive interval
/// - `DL_WHOIS_FALLBACK` — `true`/`false`, WHOIS fallback after RDAP failure
/// - `DL_BOOTSTRAP_URL` — alternate RDAP discovery document URL
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    if let Ok(val) = env::var("DL_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
            }
            _ => warn!("invalid DL_CONCURRENCY='{}', must be 1-100", val),
        }
    }

    if let Ok(val) = env::var("DL_MAX_DOMAINS") {
        match val.parse::<usize>() {
            Ok(max) if max > 0 => env_config.max_domains = Some(max),
            _ => warn!("invalid DL_MAX_DOMAINS='{}', must be a positive integer", val),
        }
    }

    if let Ok(val) = env::var("DL_RDAP_TIMEOUT") {
        match parse_duration(&val) {
            Some(timeout) => env_config.rdap_timeout = Some(timeout),
            None => warn!("invalid DL_RDAP_TIMEOUT='{}', use e.g. '10s' or '2m'", val),
        }
    }

    if let Ok(val) = env::var("DL_WHOIS_TIMEOUT") {
        match parse_duration(&val) {
            Some(timeout) => env_config.whois_timeout = Some(timeout),
            None => warn!("invalid DL_WHOIS_TIMEOUT='{}', use e.g. '10s' or '2m'", val),
        }
    }

    if let Ok(val) = env::var("DL_KEEPALIVE") {
        match parse_duration(&val) {
            Some(interval) => env_config.keepalive_interval = Some(interval),
            None => warn!("invalid DL_KEEPALIVE='{}', use e.g. '10s'", val),
        }
    }

    if let Ok(val) = env::var("DL_WHOIS_FALLBACK") {
        match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => env_config.whois_fallback = Some(true),
            "false" | "0" | "no" | "off" => env_config.whois_fallback = Some(false),
            _ => warn!("invalid DL_WHOIS_FALLBACK='{}', use true/false", val),
        }
    }

    if let Ok(url) = env::var("DL_BOOTSTRAP_URL") {
        let url = url.trim().to_string();
        if url.starts_with("http://") || url.starts_with("https://") {
            env_config.bootstrap_url = Some(url);
        } else {
            warn!("invalid DL_BOOTSTRAP_URL='{}', must be an http(s) URL", url);
        }
    }

    env_config
}

/// Parse durations like `500ms`, `10s`, `2m`. A bare number means seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse::<u64>().ok().map(Duration::from_millis);
    }
    if let Some(secs) = s.strip_suffix('s') {
        return secs.trim().parse::<u64>().ok().map(Duration::from_secs);
    }
    if let Some(mins) = s.strip_suffix('m') {
        return mins
            .trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60));
    }

    s.parse::<u64>().ok().map(Duration::from_secs)
}
