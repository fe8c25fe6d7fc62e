//! Multilingual keyword tables (English, Dutch, German, French).
//!
//! Matching is case-insensitive and phrase based. Multi-word patterns accept
//! a hyphen, underscore or whitespace between words so they also hit URL paths
//! such as `/opt-out` or `?action=opt_out`. Hrefs are additionally checked
//! against bare stems, because URLs glue words together (`list_unsubscribe`,
//! `EmailUnsubscribe.aspx`) where no word boundary exists.

use regex::{Regex, RegexSet, RegexSetBuilder};
use std::sync::LazyLock;

const UNSUBSCRIBE_KEYWORDS: &[&str] = &[
    // English
    r"\bunsub(scri\w*)?\b",
    r"\bopt[-_\s]?out\b",
    r"\bremove\s+(me|my\s+(e-?mail|address)|yourself)\b",
    r"\bstop\s+(receiving|these\s+e-?mails|e-?mails?)\b",
    r"\bcancel[-_\s]+(my\s+|your\s+)?subscription\b",
    r"\b(manage|update|change)\s+(your\s+|my\s+)?(e-?mail\s+|subscription\s+|communication\s+)?preferences\b",
    r"\be-?mail[-_\s]?preferences\b",
    r"\bno\s+longer\s+(wish\s+to\s+|want\s+to\s+)?receiv",
    // Dutch
    r"\bafmeld\w*",
    r"\buitschrijv\w*",
    r"\babonnement\s+(op)?zeggen\b",
    r"\b(voorkeuren|instellingen)\s+(beheren|aanpassen|wijzigen)\b",
    r"\bniet\s+langer\s+ontvangen\b",
    r"\bgeen\s+(e-?mails?|nieuwsbrieven?)\s+meer\b",
    // German
    r"\babmeld\w*",
    r"\babbestell\w*",
    r"\baustragen\b",
    r"\b(newsletter|abonnement)\s+kündigen\b",
    r"\b(einstellungen|präferenzen)\s+(verwalten|ändern)\b",
    r"\bnicht\s+mehr\s+(erhalten|empfangen)\b",
    // French
    r"\bd[ée]sabonn\w*",
    r"\bd[ée]sinscri\w*",
    r"\bannuler\s+(l'|mon\s+|votre\s+)?abonnement\b",
    r"\bg[ée]rer\s+(mes|vos)\s+pr[ée]f[ée]rences\b",
    r"\bne\s+plus\s+recevoir\b",
];

// No leading `\b`: letters, digits and `_` are word characters.
const HREF_STEMS: &[&str] = &[
    r"unsub",
    r"opt[-_]?out",
    r"afmeld",
    r"uitschrijv",
    r"abmeld",
    r"abbestell",
    r"d[ée]sabonn",
    r"d[ée]sinscri",
];

const CONFIRM_KEYWORDS: &[&str] = &[
    r"\bconfirm\w*",
    r"\bbevestig\w*",
    r"\bbestätig\w*",
];

const SUCCESS_PHRASES: &[&str] = &[
    // English
    r"\bunsubscribed\b",
    r"\bsuccessfully\s+(been\s+)?(removed|unsubscribed)\b",
    r"\b(have|has)\s+been\s+removed\b",
    r"\bno\s+longer\s+receive\b",
    r"\bopted[-\s]?out\b",
    r"\bunsubscribe\s+(was\s+)?successful\b",
    r"\bsubscription\s+(has\s+been\s+)?cancell?ed\b",
    // Dutch
    r"\bafgemeld\b",
    r"\buitgeschreven\b",
    r"\bsuccesvol\s+(verwijderd|afgemeld)\b",
    r"\bniet\s+langer\s+(meer\s+)?ontvangen\b",
    // German
    r"\babgemeldet\b",
    r"\bausgetragen\b",
    r"\babbestellt\b",
    r"\berfolgreich\s+(entfernt|abgemeldet)\b",
    r"\bnicht\s+mehr\s+(erhalten|empfangen)\b",
    // French
    r"\bd[ée]sabonn[ée]e?s?\b",
    r"\bd[ée]sinscrite?s?\b",
    r"\bne\s+recevrez\s+plus\b",
    r"\bsupprim[ée]e?s?\s+avec\s+succ[èe]s\b",
];

fn build_set(patterns: &[&str]) -> RegexSet {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|_| RegexSet::empty())
}

static UNSUBSCRIBE_SET: LazyLock<RegexSet> = LazyLock::new(|| build_set(UNSUBSCRIBE_KEYWORDS));

static HREF_SET: LazyLock<RegexSet> = LazyLock::new(|| build_set(HREF_STEMS));

static FORM_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    let all: Vec<&str> = UNSUBSCRIBE_KEYWORDS
        .iter()
        .chain(CONFIRM_KEYWORDS.iter())
        .copied()
        .collect();
    build_set(&all)
});

static SUCCESS_SET: LazyLock<RegexSet> = LazyLock::new(|| build_set(SUCCESS_PHRASES));

/// `mailto:` URIs anywhere in a body: local part, domain, optional query.
pub(crate) static MAILTO_URI: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)mailto:([a-z0-9._%+\-]+)@([a-z0-9.\-]+\.[a-z]{2,})(\?[^\s"'<>]*)?"#).ok()
});

/// True when the text looks like an unsubscribe mechanism in any supported language.
pub fn is_unsubscribe_text(text: &str) -> bool {
    UNSUBSCRIBE_SET.is_match(text)
}

/// Like [`is_unsubscribe_text`], but also finds stems buried inside URL words.
pub fn is_unsubscribe_href(href: &str) -> bool {
    UNSUBSCRIBE_SET.is_match(href) || HREF_SET.is_match(href)
}

/// True when a form's markup mentions unsubscribing or confirming.
pub fn is_unsubscribe_form(form_html: &str) -> bool {
    FORM_SET.is_match(form_html)
}

/// True when a page's text confirms removal from a list.
pub fn confirms_unsubscribe(text: &str) -> bool {
    SUCCESS_SET.is_match(text)
}
