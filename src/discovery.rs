//! Finds unsubscribe mechanisms in message bodies and headers.

use crate::constants::{DEFAULT_SCHEME, HEADER_DISPLAY_TEXT, MAILTO_SCHEME};
use crate::html::{decode_entities, HtmlDocument};
use crate::models::{CandidateSource, MailMessage, UnsubscribeCandidate};
use crate::patterns::{is_unsubscribe_href, is_unsubscribe_text, MAILTO_URI};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::form_urlencoded;

static HEADER_ENTRY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<\s*([^<>\s]+)\s*>").ok());

/// Collects unsubscribe candidates from a raw (usually HTML) body.
///
/// Anchors qualify when either their `href` or their visible text matches the
/// multilingual keyword table. `mailto:` URIs are also picked up outside of
/// anchors when the address or its query mentions unsubscribing. The result is
/// deduplicated by URL and keeps first-seen order; an empty list is the common
/// case and not an error.
pub fn discover(body: &str) -> Vec<UnsubscribeCandidate> {
    let mut found = Candidates::default();
    if body.trim().is_empty() {
        return found.into_vec();
    }

    let doc = HtmlDocument::parse(body);
    for anchor in doc.find_elements("a") {
        let Some(href) = anchor.attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') || starts_with_ignore_case(href, "javascript:")
        {
            continue;
        }
        // root-relative links have no host to resolve against in a mail body
        if href.starts_with('/') && !href.starts_with("//") {
            debug!(href, "skipping relative link");
            continue;
        }
        let text = anchor.text();
        if !is_unsubscribe_href(href) && !is_unsubscribe_text(&text) {
            continue;
        }
        let candidate = if is_mailto(href) {
            UnsubscribeCandidate::mailto(lowercase_mailto_scheme(href), text)
        } else {
            UnsubscribeCandidate::link(normalize_url(href), text)
        };
        found.push(candidate);
    }

    for candidate in bare_mailtos(body) {
        found.push(candidate);
    }

    let candidates = found.into_vec();
    debug!(count = candidates.len(), "discovered unsubscribe candidates");
    candidates
}

/// Parses an RFC 2369 `List-Unsubscribe` header such as
/// `<https://x.example/u?id=1>, <mailto:leave@x.example>`.
pub fn discover_from_header(list_unsubscribe: &str) -> Vec<UnsubscribeCandidate> {
    let mut found = Candidates::default();
    let Some(re) = HEADER_ENTRY.as_ref() else {
        return found.into_vec();
    };
    for caps in re.captures_iter(list_unsubscribe) {
        let Some(entry) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let candidate = if is_mailto(entry) {
            UnsubscribeCandidate::mailto(lowercase_mailto_scheme(entry), HEADER_DISPLAY_TEXT)
        } else if starts_with_ignore_case(entry, "http://")
            || starts_with_ignore_case(entry, "https://")
        {
            UnsubscribeCandidate::link(entry, HEADER_DISPLAY_TEXT)
        } else {
            continue;
        };
        found.push(candidate.with_source(CandidateSource::ListUnsubscribeHeader));
    }
    found.into_vec()
}

/// Header candidates first, then whatever the body offers.
pub fn discover_message(message: &MailMessage) -> Vec<UnsubscribeCandidate> {
    let mut found = Candidates::default();
    if let Some(header) = message.list_unsubscribe.as_deref() {
        for candidate in discover_from_header(header) {
            found.push(candidate);
        }
    }
    for candidate in discover(&message.body.content) {
        found.push(candidate);
    }
    found.into_vec()
}

fn bare_mailtos(body: &str) -> Vec<UnsubscribeCandidate> {
    let Some(re) = MAILTO_URI.as_ref() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for caps in re.captures_iter(body) {
        let (Some(local), Some(domain)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let query = caps
            .get(3)
            .map(|m| decode_entities(m.as_str()))
            .map(|q| q.trim_end_matches(['.', ',', ';', ':', ')']).to_string())
            .unwrap_or_default();
        if !is_unsubscribe_text(local.as_str()) && !query_mentions_unsubscribe(&query) {
            continue;
        }
        let email = format!("{}@{}", local.as_str(), domain.as_str());
        out.push(
            UnsubscribeCandidate::mailto(
                format!("{MAILTO_SCHEME}{email}{query}"),
                format!("Unsubscribe via {email}"),
            )
            .with_source(CandidateSource::BareMailto),
        );
    }
    out
}

fn query_mentions_unsubscribe(query: &str) -> bool {
    let raw = query.trim_start_matches('?');
    if raw.is_empty() {
        return false;
    }
    is_unsubscribe_text(raw)
        || form_urlencoded::parse(raw.replace('+', "%2B").as_bytes())
            .any(|(_, value)| is_unsubscribe_text(&value))
}

/// Adds `https://` to scheme-less links; `//host/path` keeps its host.
pub fn normalize_url(href: &str) -> String {
    let href = href.trim();
    if starts_with_ignore_case(href, "http://") || starts_with_ignore_case(href, "https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("{DEFAULT_SCHEME}{rest}")
    } else {
        format!("{DEFAULT_SCHEME}{href}")
    }
}

/// `MAILTO:x@y` and `mailto:x@y` must dedupe to one candidate.
fn lowercase_mailto_scheme(uri: &str) -> String {
    let uri = uri.trim();
    match uri.get(MAILTO_SCHEME.len()..) {
        Some(rest) if is_mailto(uri) => format!("{MAILTO_SCHEME}{rest}"),
        _ => uri.to_string(),
    }
}

pub(crate) fn is_mailto(url: &str) -> bool {
    starts_with_ignore_case(url.trim_start(), MAILTO_SCHEME)
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[derive(Default)]
struct Candidates {
    seen: HashSet<String>,
    list: Vec<UnsubscribeCandidate>,
}

impl Candidates {
    fn push(&mut self, candidate: UnsubscribeCandidate) {
        if self.seen.insert(candidate.url.clone()) {
            self.list.push(candidate);
        }
    }

    fn into_vec(self) -> Vec<UnsubscribeCandidate> {
        self.list
    }
}
