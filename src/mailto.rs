//! `mailto:` URI handling. Nothing here ever sends mail.

use crate::constants::MAILTO_SCHEME;
use crate::error::{Error, Result};
use crate::models::MailtoInstructions;

/// Splits a `mailto:` URI into address, subject and body (RFC 6068; `+` is literal).
pub fn parse_mailto(uri: &str) -> Result<MailtoInstructions> {
    let uri = uri.trim();
    let rest = uri
        .get(..MAILTO_SCHEME.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(MAILTO_SCHEME))
        .and_then(|_| uri.get(MAILTO_SCHEME.len()..))
        .ok_or_else(|| Error::InvalidUrl(format!("not a mailto uri: {uri}")))?;

    let (raw_address, query) = rest.split_once('?').unwrap_or((rest, ""));
    // Multiple recipients are allowed; the first one is where the request goes.
    let address = decode(raw_address.split(',').next().unwrap_or_default()).trim().to_string();
    if !address.contains('@') || address.starts_with('@') || address.ends_with('@') {
        return Err(Error::InvalidUrl(format!("mailto without a valid address: {uri}")));
    }

    let mut instructions = MailtoInstructions {
        address,
        subject: None,
        body: None,
    };
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode(value);
        match key.to_ascii_lowercase().as_str() {
            "subject" if instructions.subject.is_none() => instructions.subject = Some(value),
            "body" if instructions.body.is_none() => instructions.body = Some(value),
            _ => {}
        }
    }
    Ok(instructions)
}

/// One-line summary used as the outcome message.
pub fn describe(instructions: &MailtoInstructions) -> String {
    let mut message = format!("Unsubscribe email prepared for {}", instructions.address);
    if let Some(subject) = &instructions.subject {
        message.push_str(&format!(" (subject: \"{subject}\")"));
    }
    if let Some(body) = &instructions.body {
        message.push_str(&format!(" (body: \"{body}\")"));
    }
    message.push_str("; send it from the subscribed account to complete the request");
    message
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
