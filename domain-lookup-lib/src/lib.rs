//! # Domain Lookup Library
//!
//! Bulk domain registration-metadata lookup over RDAP with WHOIS fallback.
//!
//! Takes a batch of domain names plus a field selection and streams one
//! result per domain in completion order, prefixed by a total-count event
//! and interleaved with keep-alives during idle stretches. RDAP endpoints
//! are discovered through the IANA bootstrap registry; domains whose RDAP
//! lookup fails transiently fall back to the system `whois` command.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_lookup_lib::{validate_request, BatchStreamer, LookupConfig, RawLookupRequest};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raw = RawLookupRequest {
//!         domains: vec!["example.com".into(), "example.us".into()],
//!         fields: vec!["domain".into(), "registrar".into(), "statuses".into()],
//!         use_rdap: true,
//!     };
//!
//!     let config = LookupConfig::default();
//!     let request = validate_request(&raw, config.max_domains)?;
//!     let streamer = BatchStreamer::new(config)?;
//!
//!     let mut events = streamer.stream(request);
//!     while let Some(event) = events.next().await {
//!         println!("{}", serde_json::to_string(&event)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - The `total` event is always emitted before any result.
//! - Every validated domain yields exactly one `result` event; per-domain
//!   failures become error payloads, never batch aborts.
//! - EPP status codes are normalized to canonical camelCase with ICANN
//!   URL annotations stripped.
//! - Dropping the stream cancels outstanding lookups.

pub use config::{load_env_config, parse_duration, EnvConfig};
pub use error::LookupError;
pub use lookup::LookupOrchestrator;
pub use normalize::{normalize_status, normalize_statuses};
pub use protocols::{BootstrapRegistry, RdapClient, WhoisClient};
pub use request::validate_request;
pub use stream::{BatchStreamer, EventStream};
pub use types::{
    DomainRecord, DomainResult, Field, LookupConfig, LookupEvent, LookupMethod, LookupRequest,
    RawLookupRequest, NEXUS_NOT_APPLICABLE, NOT_AVAILABLE_VIA_RDAP, NOT_FOUND,
};

mod config;
mod error;
mod lookup;
mod normalize;
mod protocols;
mod request;
mod stream;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LookupError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
