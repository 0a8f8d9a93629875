//! Status normalization shared by the RDAP and WHOIS clients.
//!
//! Registries embed EPP status codes in wildly inconsistent shapes:
//! `"clientTransferProhibited https://icann.org/epp#clientTransferProhibited"`,
//! `"client transfer prohibited"`, semicolon-joined multi-status strings,
//! or bare informational URLs. This module canonicalizes all of them into
//! plain camelCase EPP tokens. Unknown tokens pass through verbatim so no
//! information is silently lost.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// The standard EPP status codes (RFC 5731 plus the client/server grace
/// period codes), keyed by their squashed lowercase form.
const EPP_STATUS_CODES: [&str; 23] = [
    "ok",
    "inactive",
    "addPeriod",
    "autoRenewPeriod",
    "renewPeriod",
    "redemptionPeriod",
    "transferPeriod",
    "pendingCreate",
    "pendingDelete",
    "pendingRenew",
    "pendingRestore",
    "pendingTransfer",
    "pendingUpdate",
    "serverHold",
    "serverDeleteProhibited",
    "serverRenewProhibited",
    "serverTransferProhibited",
    "serverUpdateProhibited",
    "clientHold",
    "clientDeleteProhibited",
    "clientRenewProhibited",
    "clientTransferProhibited",
    "clientUpdateProhibited",
];

lazy_static! {
    /// Delimiters used by registries to pack several statuses into one entry.
    static ref STATUS_DELIMITERS: Regex = Regex::new(r"[;,\n]+").unwrap();

    /// Squashed-lowercase form -> canonical camelCase EPP token.
    static ref EPP_CANONICAL: HashMap<String, &'static str> = EPP_STATUS_CODES
        .iter()
        .map(|code| (code.to_lowercase(), *code))
        .collect();
}

/// Normalize one raw status entry into zero or more plain EPP codes.
///
/// Applied rules, in order: split on embedded delimiters, strip any trailing
/// explanatory URL (or recover the code from a URL-only entry), strip
/// surrounding punctuation, and map spaced/underscored/miscased variants to
/// the canonical camelCase token. Idempotent: an already-normalized code
/// comes back unchanged.
pub fn normalize_status(raw: &str) -> Vec<String> {
    let mut codes = Vec::new();

    for piece in STATUS_DELIMITERS.split(raw) {
        let code = extract_status_code(piece);
        if code.is_empty() {
            continue;
        }
        let token = canonicalize(&code);
        if !codes.contains(&token) {
            codes.push(token);
        }
    }

    codes
}

/// Normalize a sequence of raw entries, deduplicating across entries while
/// preserving first-seen order.
pub fn normalize_statuses<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut codes = Vec::new();
    for entry in raw {
        for token in normalize_status(entry.as_ref()) {
            if !codes.contains(&token) {
                codes.push(token);
            }
        }
    }
    codes
}

/// Strip an appended explanatory URL and surrounding punctuation from one
/// status phrase. An entry that is only a URL yields the fragment after `#`
/// (or the last path segment) since ICANN links encode the code there.
fn extract_status_code(piece: &str) -> String {
    let mut s = piece.trim();
    if s.is_empty() {
        return String::new();
    }

    if s.contains("http://") || s.contains("https://") {
        // Prefer the token before the URL when there is one
        if let Some(pre) = s.split(" http").next() {
            let pre = pre.trim();
            if !pre.is_empty() && !pre.starts_with("http") {
                s = pre;
            } else {
                // URL-only entry: take the fragment, else the last path segment
                let url = s.trim_end_matches('/');
                s = match url.rsplit_once('#') {
                    Some((_, fragment)) => fragment,
                    None => url.rsplit('/').next().unwrap_or(url),
                };
            }
        }
    }

    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, ';' | '.' | ',' | '(' | ')' | '"' | '\''))
        .to_string()
}

/// Map a cleaned status phrase to its canonical camelCase EPP token.
///
/// Known codes are matched case-insensitively ignoring spaces, hyphens and
/// underscores. Unknown multi-word phrases are camelCased; unknown single
/// tokens pass through verbatim.
fn canonicalize(code: &str) -> String {
    let squashed: String = code
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase();

    if let Some(canonical) = EPP_CANONICAL.get(&squashed) {
        return (*canonical).to_string();
    }

    if code.contains(|c: char| c.is_whitespace() || c == '_') {
        return camel_case(code);
    }

    code.to_string()
}

fn camel_case(phrase: &str) -> String {
    let mut out = String::with_capacity(phrase.len());
    for (i, word) in phrase
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_trailing_icann_url() {
        assert_eq!(
            normalize_status("clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited"),
            vec!["clientDeleteProhibited"]
        );
    }

    #[test]
    fn test_url_only_entry_recovers_fragment() {
        assert_eq!(
            normalize_status("https://icann.org/epp#serverTransferProhibited"),
            vec!["serverTransferProhibited"]
        );
    }

    #[test]
    fn test_spaced_variant_maps_to_camel_case() {
        assert_eq!(
            normalize_status("client transfer prohibited"),
            vec!["clientTransferProhibited"]
        );
        assert_eq!(
            normalize_status("CLIENT_UPDATE_PROHIBITED"),
            vec!["clientUpdateProhibited"]
        );
    }

    #[test]
    fn test_combined_entry_splits_on_delimiters() {
        let raw = "clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited; \
                   clientTransferProhibited https://icann.org/epp#clientTransferProhibited";
        assert_eq!(
            normalize_status(raw),
            vec!["clientDeleteProhibited", "clientTransferProhibited"]
        );
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_status("client transfer prohibited");
        let twice = normalize_status(&once[0]);
        assert_eq!(once, twice);

        assert_eq!(normalize_status("ok"), vec!["ok"]);
    }

    #[test]
    fn test_unknown_token_passes_through() {
        assert_eq!(normalize_status("registryLockActive"), vec!["registryLockActive"]);
        // Unknown multi-word phrases still get camelCased for consistency
        assert_eq!(normalize_status("registry lock active"), vec!["registryLockActive"]);
    }

    #[test]
    fn test_surrounding_punctuation_stripped() {
        assert_eq!(normalize_status("  clientHold; "), vec!["clientHold"]);
        assert_eq!(normalize_status("(inactive)"), vec!["inactive"]);
    }

    #[test]
    fn test_dedup_across_entries_preserves_order() {
        let raw = [
            "serverUpdateProhibited",
            "clientHold",
            "serverUpdateProhibited https://icann.org/epp#serverUpdateProhibited",
        ];
        assert_eq!(
            normalize_statuses(raw),
            vec!["serverUpdateProhibited", "clientHold"]
        );
    }

    #[test]
    fn test_empty_and_blank_entries_dropped() {
        assert!(normalize_status("").is_empty());
        assert!(normalize_status("  ;  ;").is_empty());
    }
}
