//! Registrable-domain decomposition backed by the public suffix list

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

static IPV4_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").expect("IPv4 pattern is valid")
});

pub const LOCALHOST: &str = "localhost";

/// Structured identity of the site a session was saved on.
///
/// Captured once at save time and stored with the session; never recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfo {
    /// SLD + public suffix, e.g. `bbc.co.uk`. Empty for IP hosts.
    pub registrable_domain: String,
    pub subdomain: String,
    /// Registrable domain without its public suffix, e.g. `bbc`.
    pub second_level_domain: String,
    /// The public suffix, e.g. `co.uk`.
    pub top_level_domain: String,
    pub fully_qualified_hostname: String,
    pub is_ip_address: bool,
    pub is_icann_managed: bool,
}

impl DomainInfo {
    fn ip(host: &str) -> DomainInfo {
        DomainInfo {
            fully_qualified_hostname: host.to_string(),
            is_ip_address: true,
            ..DomainInfo::default()
        }
    }

    fn localhost() -> DomainInfo {
        DomainInfo {
            registrable_domain: LOCALHOST.to_string(),
            second_level_domain: LOCALHOST.to_string(),
            fully_qualified_hostname: LOCALHOST.to_string(),
            ..DomainInfo::default()
        }
    }

    /// Fallback when the suffix list has no answer: the raw host stands in
    /// for both the registrable domain and the FQDN.
    fn raw(host: &str) -> DomainInfo {
        DomainInfo {
            registrable_domain: host.to_string(),
            second_level_domain: host.to_string(),
            fully_qualified_hostname: host.to_string(),
            ..DomainInfo::default()
        }
    }
}

/// Decompose a hostname into registrable domain, subdomain and suffix.
///
/// Algorithm:
/// 1. Normalize (trim, lowercase, drop a trailing root dot)
/// 2. IPv4 / bracketed IPv6 literal → IP decomposition, no suffix matching
/// 3. `localhost` → its own registrable domain
/// 4. Find the ICANN public suffix; the registrable domain is one label more
/// 5. Anything the list cannot answer → raw hostname decomposition
///
/// Examples:
/// - `app.example.com` → `example.com` / `app` / `example` / `com`
/// - `news.bbc.co.uk` → `bbc.co.uk` / `news` / `bbc` / `co.uk`
/// - `alice.github.io` → `github.io` / `alice` / `github` / `io`
/// - `203.0.113.5` → IP, FQDN only
pub fn parse_hostname(hostname: &str) -> DomainInfo {
    let host = hostname.trim().trim_end_matches('.').to_lowercase();

    if is_ipv4_literal(&host) || (host.starts_with('[') && host.ends_with(']')) {
        return DomainInfo::ip(&host);
    }

    if host == LOCALHOST {
        return DomainInfo::localhost();
    }

    let Some((tld, kind)) = icann_suffix(&host) else {
        return DomainInfo::raw(&host);
    };
    let Some(prefix) = host.strip_suffix(tld).and_then(|p| p.strip_suffix('.')) else {
        // a bare public suffix has no registrable domain
        return DomainInfo::raw(&host);
    };

    let (subdomain, sld) = prefix.rsplit_once('.').unwrap_or(("", prefix));

    DomainInfo {
        registrable_domain: format!("{}.{}", sld, tld),
        subdomain: subdomain.to_string(),
        second_level_domain: sld.to_string(),
        top_level_domain: tld.to_string(),
        fully_qualified_hostname: host.clone(),
        is_ip_address: false,
        is_icann_managed: kind == Some(psl::Type::Icann),
    }
}

/// Public suffix of `host`, ICANN section only.
///
/// Private entries (`github.io`, `vercel.app`) are skipped by dropping their
/// leftmost label and looking the rest up again, so `alice.github.io` has
/// the suffix `io`. Unlisted TLDs come back with no type.
fn icann_suffix(host: &str) -> Option<(&str, Option<psl::Type>)> {
    let mut candidate = host;
    loop {
        let suffix = psl::suffix(candidate.as_bytes())?;
        let len = suffix.as_bytes().len();
        let text = candidate.get(candidate.len().checked_sub(len)?..)?;

        if suffix.typ() != Some(psl::Type::Private) {
            return Some((text, suffix.typ()));
        }
        match text.split_once('.') {
            Some((_, rest)) => candidate = rest,
            None => return Some((text, None)),
        }
    }
}

/// Whether `host` is itself an ICANN public suffix, e.g. `co.uk` or `com`
pub fn is_public_suffix(host: &str) -> bool {
    matches!(icann_suffix(host), Some((suffix, Some(psl::Type::Icann))) if suffix == host)
}

/// Decompose the host of a full URL.
///
/// A URL that does not parse (or has no host) is treated as a bare hostname
/// after stripping any scheme, path and port, so domain identity never blocks
/// a save.
pub fn parse_url(url: &str) -> DomainInfo {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => parse_hostname(host),
            None => parse_hostname(&extract_hostname(url)),
        },
        Err(_) => parse_hostname(&extract_hostname(url)),
    }
}

/// Registrable domain of a hostname, lowercase. Empty for IP literals.
pub fn registrable_domain(hostname: &str) -> String {
    parse_hostname(hostname).registrable_domain
}

/// Dotted-quad check. Deliberately loose: `999.1.1.1` still counts, the same
/// way the browser side classifies hosts.
pub fn is_ipv4_literal(host: &str) -> bool {
    IPV4_LITERAL.is_match(host)
}

/// Best-effort hostname from something that is not a valid URL
fn extract_hostname(url: &str) -> String {
    let without_scheme = url
        .trim()
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url.trim());

    let host_with_port = without_scheme.split(['/', '?', '#']).next().unwrap_or_default();
    let host = host_with_port.rsplit('@').next().unwrap_or_default();

    host.split(':').next().unwrap_or_default().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hostname_basic() {
        let info = parse_hostname("app.example.com");

        assert_eq!(info.registrable_domain, "example.com");
        assert_eq!(info.subdomain, "app");
        assert_eq!(info.second_level_domain, "example");
        assert_eq!(info.top_level_domain, "com");
        assert_eq!(info.fully_qualified_hostname, "app.example.com");
        assert!(!info.is_ip_address);
        assert!(info.is_icann_managed);
    }

    #[test]
    fn test_parse_hostname_apex() {
        let info = parse_hostname("example.com");

        assert_eq!(info.registrable_domain, "example.com");
        assert_eq!(info.subdomain, "");
        assert_eq!(info.fully_qualified_hostname, "example.com");
    }

    #[test]
    fn test_parse_hostname_multi_label_suffix() {
        let info = parse_hostname("news.bbc.co.uk");
        assert_eq!(info.registrable_domain, "bbc.co.uk");
        assert_eq!(info.subdomain, "news");
        assert_eq!(info.second_level_domain, "bbc");
        assert_eq!(info.top_level_domain, "co.uk");

        let info = parse_hostname("a.b.shop.example.com.au");
        assert_eq!(info.registrable_domain, "example.com.au");
        assert_eq!(info.subdomain, "a.b.shop");
        assert_eq!(info.top_level_domain, "com.au");
    }

    #[test]
    fn test_parse_hostname_private_suffix_ignored() {
        let info = parse_hostname("alice.github.io");

        assert_eq!(info.registrable_domain, "github.io");
        assert_eq!(info.subdomain, "alice");
        assert_eq!(info.second_level_domain, "github");
        assert_eq!(info.top_level_domain, "io");
        assert!(info.is_icann_managed);

        let info = parse_hostname("github.io");
        assert_eq!(info.registrable_domain, "github.io");
        assert_eq!(info.top_level_domain, "io");
        assert_eq!(info.subdomain, "");

        let info = parse_hostname("my-app.herokuapp.com");
        assert_eq!(info.registrable_domain, "herokuapp.com");
        assert_eq!(info.subdomain, "my-app");
    }

    #[test]
    fn test_is_public_suffix() {
        assert!(is_public_suffix("com"));
        assert!(is_public_suffix("co.uk"));
        assert!(!is_public_suffix("github.io"));
        assert!(!is_public_suffix("example.com"));
        assert!(!is_public_suffix("intranet"));
    }

    #[test]
    fn test_parse_hostname_ipv4() {
        let info = parse_hostname("203.0.113.5");

        assert!(info.is_ip_address);
        assert_eq!(info.registrable_domain, "");
        assert_eq!(info.fully_qualified_hostname, "203.0.113.5");
    }

    #[test]
    fn test_parse_hostname_ipv6() {
        let info = parse_url("http://[::1]:8080/");

        assert!(info.is_ip_address);
        assert_eq!(info.fully_qualified_hostname, "[::1]");
    }

    #[test]
    fn test_parse_hostname_localhost() {
        let info = parse_hostname("localhost");

        assert_eq!(info.registrable_domain, "localhost");
        assert_eq!(info.second_level_domain, "localhost");
        assert_eq!(info.top_level_domain, "");
        assert!(!info.is_ip_address);
    }

    #[test]
    fn test_parse_hostname_normalizes() {
        let info = parse_hostname("  WWW.Example.COM. ");

        assert_eq!(info.registrable_domain, "example.com");
        assert_eq!(info.fully_qualified_hostname, "www.example.com");
    }

    #[test]
    fn test_parse_hostname_fallback() {
        // a bare public suffix has no registrable domain
        let info = parse_hostname("co.uk");
        assert_eq!(info.registrable_domain, "co.uk");
        assert_eq!(info.fully_qualified_hostname, "co.uk");

        let info = parse_hostname("intranet");
        assert_eq!(info.registrable_domain, "intranet");
        assert!(!info.registrable_domain.is_empty());
    }

    #[test]
    fn test_parse_url() {
        let info = parse_url("https://app.example.com/dashboard?tab=1");
        assert_eq!(info.registrable_domain, "example.com");
        assert_eq!(info.fully_qualified_hostname, "app.example.com");

        let info = parse_url("http://localhost:3000/login");
        assert_eq!(info.registrable_domain, "localhost");
    }

    #[test]
    fn test_parse_url_not_a_url() {
        let info = parse_url("shop.example.com.au/products");
        assert_eq!(info.registrable_domain, "example.com.au");

        let info = parse_url("weird://user@host.example.org:99/x");
        assert_eq!(info.registrable_domain, "example.org");
    }

    #[test]
    fn test_is_ipv4_literal() {
        assert!(is_ipv4_literal("127.0.0.1"));
        assert!(is_ipv4_literal("192.168.1.1"));
        assert!(!is_ipv4_literal("1.2.3"));
        assert!(!is_ipv4_literal("example.com"));
        assert!(!is_ipv4_literal("1.2.3.4.example.com"));
    }
}
