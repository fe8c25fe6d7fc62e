//! Public data models produced and consumed by the client.

use crate::constants::{default_timeout, DEFAULT_MAX_REDIRECTS, PLACEHOLDER_EMAIL};
use crate::error::FailureKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a candidate gets executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Link,
    Mailto,
}

/// Where in the message a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Anchor,
    BareMailto,
    ListUnsubscribeHeader,
}

/// An unsubscribe mechanism discovered in a message, not yet executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeCandidate {
    /// Absolute http(s) URL or a `mailto:` URI.
    pub url: String,
    /// Anchor text or a synthesized description. Never executed.
    pub display_text: String,
    pub kind: CandidateKind,
    pub source: CandidateSource,
}

impl UnsubscribeCandidate {
    pub fn link(url: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_text: display_text.into(),
            kind: CandidateKind::Link,
            source: CandidateSource::Anchor,
        }
    }

    pub fn mailto(url: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_text: display_text.into(),
            kind: CandidateKind::Mailto,
            source: CandidateSource::Anchor,
        }
    }

    pub fn with_source(mut self, source: CandidateSource) -> Self {
        self.source = source;
        self
    }
}

/// Strategy that produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsubscribeMethod {
    Get,
    Mailto,
    Form,
}

/// Tri-state view of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// A page confirmed the removal.
    Completed,
    /// A mailto was prepared but nothing was sent.
    InstructionsOnly,
    Failed,
}

/// Best-effort verdict for one executed candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeOutcome {
    pub succeeded: bool,
    pub method: UnsubscribeMethod,
    /// Human-readable summary.
    pub message: String,
    /// Status code, host or form target.
    pub detail: Option<String>,
    /// Set whenever `succeeded` is false.
    pub failure: Option<FailureKind>,
    pub attempted_at: DateTime<Utc>,
}

impl UnsubscribeOutcome {
    pub(crate) fn success(
        method: UnsubscribeMethod,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            succeeded: true,
            method,
            message: message.into(),
            detail,
            failure: None,
            attempted_at: Utc::now(),
        }
    }

    pub(crate) fn failure(
        method: UnsubscribeMethod,
        kind: FailureKind,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            succeeded: false,
            method,
            message: message.into(),
            detail,
            failure: Some(kind),
            attempted_at: Utc::now(),
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match (self.succeeded, self.method) {
            (true, UnsubscribeMethod::Mailto) => OutcomeStatus::InstructionsOnly,
            (true, _) => OutcomeStatus::Completed,
            (false, _) => OutcomeStatus::Failed,
        }
    }
}

/// Address and parameters parsed out of a `mailto:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailtoInstructions {
    pub address: String,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMethod {
    Get,
    Post,
}

/// A `<form>` chosen for submission, with every field already filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDescriptor {
    /// Absolute submission URL.
    pub action: String,
    pub method: FormMethod,
    /// Field name and synthesized value, in document order.
    pub fields: Vec<(String, String)>,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Budget for each individual HTTP exchange.
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Fixed user agent; a browser one is picked at random when unset.
    pub user_agent: Option<String>,
    /// Value put into form fields whose name mentions "email".
    pub placeholder_email: String,
    pub proxy_url: Option<String>,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` when no explicit proxy is set.
    pub system_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: None,
            placeholder_email: PLACEHOLDER_EMAIL.to_string(),
            proxy_url: None,
            system_proxy: true,
        }
    }
}

impl Config {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_placeholder_email(mut self, email: impl Into<String>) -> Self {
        self.placeholder_email = email.into();
        self
    }
}

/// Mail provider an account is connected through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Microsoft,
    Google,
    Yahoo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub address: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Html,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub content: String,
    pub content_type: ContentType,
}

/// A message as handed over by a provider's mail fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: String,
    pub subject: String,
    pub sender: Sender,
    pub body: MessageBody,
    pub received_at: DateTime<Utc>,
    /// Raw `List-Unsubscribe` header, when the provider exposes headers.
    #[serde(default)]
    pub list_unsubscribe: Option<String>,
}

/// Classifier verdict for one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamVerdict {
    pub is_spam: bool,
    /// 0 to 100.
    pub confidence: u8,
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailto_success_is_instructions_only() {
        let outcome = UnsubscribeOutcome::success(UnsubscribeMethod::Mailto, "prepared", None);
        assert_eq!(outcome.status(), OutcomeStatus::InstructionsOnly);

        let outcome = UnsubscribeOutcome::success(UnsubscribeMethod::Form, "done", None);
        assert_eq!(outcome.status(), OutcomeStatus::Completed);
    }

    #[test]
    fn failures_carry_their_kind() {
        let outcome = UnsubscribeOutcome::failure(
            UnsubscribeMethod::Get,
            FailureKind::HttpStatus,
            "HTTP 404",
            Some("404".into()),
        );
        assert!(!outcome.succeeded);
        assert_eq!(outcome.failure, Some(FailureKind::HttpStatus));
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
    }

    #[test]
    fn default_config_uses_ten_second_budget() {
        let cfg = Config::default();
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.placeholder_email, "user@example.com");
        assert!(cfg.user_agent.is_none());
    }
}
