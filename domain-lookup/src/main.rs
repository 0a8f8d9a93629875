//! Domain Lookup CLI Application
//!
//! A command-line interface for bulk domain registration-metadata lookups
//! using RDAP with WHOIS fallback. Results stream to the terminal as they
//! complete, or as NDJSON events with --json.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_lookup_lib::{
    load_env_config, validate_request, BatchStreamer, LookupConfig, LookupEvent, RawLookupRequest,
};
use futures::StreamExt;
use std::io::BufRead;
use std::process;
use std::time::Instant;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-lookup
#[derive(Parser, Debug)]
#[command(name = "domain-lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up domain registration data using RDAP with WHOIS fallback")]
#[command(
    long_about = "Look up registration metadata (registrar, statuses, creation date, nameservers, \
    .US nexus categories) for batches of domains.\n\nRDAP endpoints are discovered via the IANA \
    bootstrap registry; transient RDAP failures fall back to the system whois command. Results \
    stream in completion order."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to look up (fully qualified, e.g. example.com)
    #[arg(value_name = "DOMAINS")]
    pub domains: Vec<String>,

    /// Input file with domains (one per line, # starts a comment)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<String>,

    /// Fields to return (comma-separated)
    #[arg(
        long = "fields",
        value_name = "FIELDS",
        value_delimiter = ',',
        default_values_t = [
            "domain".to_string(),
            "registrar".to_string(),
            "statuses".to_string(),
            "creation_date".to_string(),
            "nameservers".to_string(),
        ]
    )]
    pub fields: Vec<String>,

    /// Skip RDAP and query WHOIS directly
    #[arg(long = "whois-only")]
    pub whois_only: bool,

    /// Max concurrent lookups (1-100)
    #[arg(short = 'c', long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Max domains accepted per run
    #[arg(long = "max", value_name = "N")]
    pub max_domains: Option<usize>,

    /// Emit raw NDJSON events instead of formatted output
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Show debug-level detail about lookups
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(args.verbose);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_lookup(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "domain_lookup=debug,domain_lookup_lib=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.domains.is_empty() && args.file.is_none() {
        return Err("You must specify domain names or a file with --file".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    Ok(())
}

/// Build the effective configuration: defaults, then DL_* environment
/// variables, then CLI flags on top.
fn build_config(args: &Args) -> LookupConfig {
    let mut config = load_env_config().apply(LookupConfig::default());

    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(max) = args.max_domains {
        config = config.with_max_domains(max);
    }

    config
}

/// Collect domains from positional args plus the optional input file.
fn collect_domains(args: &Args) -> Result<Vec<String>, String> {
    let mut domains = args.domains.clone();

    if let Some(path) = &args.file {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Cannot read file '{}': {}", path, e))?;
        for line in std::io::BufReader::new(file).lines() {
            let line = line.map_err(|e| format!("Cannot read file '{}': {}", path, e))?;
            let entry = line.split('#').next().unwrap_or("").trim();
            if !entry.is_empty() {
                domains.push(entry.to_string());
            }
        }
    }

    Ok(domains)
}

async fn run_lookup(args: Args) -> Result<(), String> {
    let config = build_config(&args);
    let domains = collect_domains(&args)?;

    let raw = RawLookupRequest {
        domains,
        fields: args.fields.clone(),
        use_rdap: !args.whois_only,
    };

    // Validation failures abort before any lookup is dispatched
    let request = validate_request(&raw, config.max_domains).map_err(|e| e.to_string())?;

    let concurrency = config.concurrency;
    let streamer = BatchStreamer::new(config).map_err(|e| e.to_string())?;
    let started = Instant::now();

    let mut events = streamer.stream(request);

    if args.json {
        while let Some(event) = events.next().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Error: cannot serialize event: {}", e),
            }
        }
        return Ok(());
    }

    let mut total = 0usize;
    let mut completed = 0usize;
    let mut failed = 0usize;

    while let Some(event) = events.next().await {
        match event {
            LookupEvent::Total { total: n } => {
                total = n;
                ui::print_header(total, concurrency);
            }
            LookupEvent::Result(result) => {
                completed += 1;
                if result.is_error() {
                    failed += 1;
                }
                ui::print_result(&result, (completed, total));
            }
            // Keep-alives and progress messages matter on the wire, not here
            LookupEvent::Message { .. } | LookupEvent::KeepAlive => {}
        }
    }

    ui::print_summary(completed, failed, started.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_from(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_fields() {
        let args = args_from(&["domain-lookup", "example.com"]);
        assert_eq!(
            args.fields,
            vec!["domain", "registrar", "statuses", "creation_date", "nameservers"]
        );
        assert!(!args.whois_only);
    }

    #[test]
    fn test_fields_flag_splits_on_commas() {
        let args = args_from(&["domain-lookup", "example.com", "--fields", "domain,nexus_categories"]);
        assert_eq!(args.fields, vec!["domain", "nexus_categories"]);
    }

    #[test]
    fn test_requires_domains_or_file() {
        let args = args_from(&["domain-lookup"]);
        assert!(validate_args(&args).is_err());

        let args = args_from(&["domain-lookup", "-f", "domains.txt"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        let args = args_from(&["domain-lookup", "example.com", "-c", "0"]);
        assert!(validate_args(&args).is_err());

        let args = args_from(&["domain-lookup", "example.com", "-c", "101"]);
        assert!(validate_args(&args).is_err());

        let args = args_from(&["domain-lookup", "example.com", "-c", "50"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_cli_flags_override_config() {
        let args = args_from(&["domain-lookup", "example.com", "-c", "25", "--max", "1000"]);
        let config = build_config(&args);
        assert_eq!(config.concurrency, 25);
        assert_eq!(config.max_domains, 1000);
    }
}
