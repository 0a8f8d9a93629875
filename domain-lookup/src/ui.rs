//! Terminal display logic for the domain-lookup CLI.
//!
//! Renders the lookup event stream as colored result lines with a
//! progress counter, plus a run header and summary. Uses only the
//! `console` crate.

use console::{pad_str, style, Alignment};
use domain_lookup_lib::DomainResult;
use std::time::Duration;

const DOMAIN_WIDTH: usize = 30;

/// Print a styled header at the start of a run.
pub fn print_header(domain_count: usize, concurrency: usize) {
    println!(
        "{} {} {}",
        style("domain-lookup").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "— Looking up {} domain{}",
            domain_count,
            if domain_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );
    println!("{}", style(format!("Concurrency: {}", concurrency)).dim());
    println!();
}

/// Format and print one domain result with a `[current/total]` counter.
pub fn print_result(result: &DomainResult, counter: (usize, usize)) {
    let (current, total) = counter;
    let prefix = style(format!("[{}/{}]", current, total)).dim();
    let padded_domain = pad_str(&result.domain, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    if let Some(error) = &result.error {
        println!(
            "  {} {}  {}  {}",
            prefix,
            style(&padded_domain).white(),
            style("FAILED").red().bold(),
            style(error).dim(),
        );
        return;
    }

    let method = result
        .method
        .map(|m| format!("[{}]", m))
        .unwrap_or_default();

    println!(
        "  {} {}  {} {}",
        prefix,
        style(&padded_domain).white(),
        style("OK").green().bold(),
        style(method).cyan(),
    );

    for (label, value) in field_lines(result) {
        println!(
            "      {} {}",
            style(format!("{:<18}", label)).dim(),
            value
        );
    }
}

/// Print the end-of-run summary line.
pub fn print_summary(completed: usize, failed: usize, elapsed: Duration) {
    let succeeded = completed - failed;
    println!();
    println!(
        "{} {} {} {} {} {}",
        style("Done:").bold(),
        style(format!("{} succeeded", succeeded)).green(),
        style("/").dim(),
        style(format!("{} failed", failed)).red(),
        style("in").dim(),
        style(format!("{:.1}s", elapsed.as_secs_f64())).dim(),
    );
}

/// The label/value pairs to display beneath a successful result, in a
/// stable order. Only fields present in the payload are shown.
fn field_lines(result: &DomainResult) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();

    if let Some(registrar) = &result.registrar {
        lines.push(("registrar", registrar.clone()));
    }
    if let Some(name) = &result.registrant_name {
        lines.push(("registrant name", name.clone()));
    }
    if let Some(statuses) = &result.statuses {
        lines.push(("statuses", statuses.join(", ")));
    }
    if let Some(created) = &result.creation_date {
        lines.push(("created", created.clone()));
    }
    if let Some(nexus) = &result.nexus_categories {
        lines.push(("nexus", nexus.clone()));
    }
    if let Some(nameservers) = &result.nameservers {
        lines.push(("nameservers", nameservers.join(", ")));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_lookup_lib::{DomainRecord, Field, LookupMethod};

    #[test]
    fn test_field_lines_follow_payload_presence() {
        let record = DomainRecord {
            registrar: Some("Example Registrar".to_string()),
            statuses: vec!["clientTransferProhibited".to_string()],
            ..Default::default()
        };
        let result = DomainResult::from_record(
            "example.com",
            &record,
            &[Field::Domain, Field::Registrar, Field::Statuses],
            LookupMethod::Rdap,
        );

        let lines = field_lines(&result);
        let labels: Vec<&str> = lines.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["registrar", "statuses"]);
        assert_eq!(lines[1].1, "clientTransferProhibited");
    }

    #[test]
    fn test_failed_result_has_no_field_lines() {
        let result = DomainResult::failed("broken.test", "RDAP error; WHOIS error");
        assert!(field_lines(&result).is_empty());
    }
}
