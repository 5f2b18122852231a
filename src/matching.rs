//! Which saved sessions apply to a page, and in what order
use url::Url;

use crate::domain::{LOCALHOST, is_ipv4_literal, is_public_suffix, registrable_domain};
use crate::error::{Result, UrlRejection};
use crate::session_data::Session;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];
const EXACT_MATCH_SCORE: u8 = 1;
const NO_MATCH_SCORE: u8 = 0;

/// Parse a tab URL and refuse anything we must not inject into.
///
/// http/https pages and anything on `localhost` pass; browser-internal and
/// other schemes are rejected before matching.
pub fn validate_target_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|_| UrlRejection::InvalidUrl)?;

    let allowed = ALLOWED_SCHEMES.contains(&url.scheme()) || url.host_str() == Some(LOCALHOST);
    if !allowed {
        return Err(UrlRejection::UnsupportedProtocol.into());
    }

    Ok(url)
}

/// Whether `session` belongs to the site at `target_host`.
///
/// Rules are tried in order and the first applicable one decides:
/// 1. `localhost` matches sessions saved on localhost
/// 2. an IP host, or a session saved on one, matches only the exact same host
/// 3. same registrable domain, or the host is a subdomain of the saved one;
///    a session saved on a bare public suffix matches only that exact host
pub fn session_matches(session: &Session, target_host: &str) -> bool {
    let target_host = target_host.to_lowercase();
    let saved = &session.domain;

    if target_host == LOCALHOST && saved.second_level_domain == LOCALHOST {
        return true;
    }

    if is_ipv4_literal(&target_host) {
        return target_host == saved.fully_qualified_hostname;
    }

    // IPv6 hosts, and IP sessions viewed from a named host, only match exactly
    if saved.is_ip_address || target_host.starts_with('[') {
        return target_host == saved.fully_qualified_hostname;
    }

    let session_domain = saved.registrable_domain.to_lowercase();
    if session_domain.is_empty() {
        return false;
    }
    // a page served on a bare suffix (`co.uk`) is not a parent of every site under it
    if is_public_suffix(&session_domain) {
        return target_host == saved.fully_qualified_hostname;
    }

    registrable_domain(&target_host) == session_domain
        || target_host.ends_with(&format!(".{}", session_domain))
}

/// Sessions relevant to `target_host`, in storage order
pub fn filter_sessions_for_host(target_host: &str, sessions: &[Session]) -> Vec<Session> {
    sessions
        .iter()
        .filter(|session| session_matches(session, target_host))
        .cloned()
        .collect()
}

fn exact_match_score(session: &Session, target_host: &str) -> u8 {
    if session.domain.fully_qualified_hostname.eq_ignore_ascii_case(target_host) {
        EXACT_MATCH_SCORE
    } else {
        NO_MATCH_SCORE
    }
}

/// Order matched sessions: exact hostname first, then newest first.
///
/// The sort is stable, so equal keys keep storage order. Exact matches show
/// the tab's live favicon; that swap only affects the returned copies.
pub fn rank_sessions(
    mut sessions: Vec<Session>,
    target_host: &str,
    live_favicon: Option<&str>,
) -> Vec<Session> {
    if let Some(favicon) = live_favicon.filter(|f| !f.is_empty()) {
        for session in sessions.iter_mut() {
            if exact_match_score(session, target_host) == EXACT_MATCH_SCORE {
                session.icon_url = favicon.to_string();
            }
        }
    }

    sessions.sort_by(|a, b| {
        exact_match_score(b, target_host)
            .cmp(&exact_match_score(a, target_host))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    sessions
}

/// Filter then rank, for a validated tab URL
pub fn matching_sessions(url: &Url, sessions: &[Session], live_favicon: Option<&str>) -> Vec<Session> {
    let host = url.host_str().unwrap_or_default();
    rank_sessions(filter_sessions_for_host(host, sessions), host, live_favicon)
}
