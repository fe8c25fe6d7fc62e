use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_SCHEME: &str = "https://";
pub const MAILTO_SCHEME: &str = "mailto:";

/// Stand-in for the recipient address when a form asks for one.
pub const PLACEHOLDER_EMAIL: &str = "user@example.com";
pub const SUBMIT_FALLBACK_VALUE: &str = "Unsubscribe";
pub const CONFIRM_FIELD_VALUE: &str = "1";
pub const HEADER_DISPLAY_TEXT: &str = "List-Unsubscribe header";
/// How much of an error page is kept on `Error::Status`.
pub const STATUS_BODY_PREVIEW: usize = 200;

// Desktop browsers as of mid 2026; unsubscribe pages often reject obvious bots.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0) Gecko/20100101 Firefox/140.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
];

pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("accept-language", "en-US,en;q=0.9,nl;q=0.8,de;q=0.7,fr;q=0.6"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
];

// Form submissions look like a user clicking a button on the landing page
pub const FORM_HEADERS: &[(&str, &str)] = &[
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
];

pub fn default_headers() -> HeaderMap {
    build_headers(DEFAULT_HEADERS, &[])
}

pub fn build_headers(base: &[(&str, &str)], extras: &[(&str, &str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (k, v) in base.iter().chain(extras.iter()) {
        if let Ok(name) = HeaderName::from_bytes(k.as_bytes()) {
            if let Ok(val) = HeaderValue::from_str(v) {
                headers.insert(name, val);
            }
        }
    }
    headers
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

pub fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}
