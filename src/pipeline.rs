//! Per-message glue: classify, discover, execute, record.

use crate::client::UnsubscribeClient;
use crate::collaborators::{OutcomeRecorder, SpamClassifier};
use crate::discovery::discover_message;
use crate::error::Result;
use crate::html::extract_text;
use crate::models::{ContentType, MailMessage, SpamVerdict, UnsubscribeCandidate, UnsubscribeOutcome};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Which discovered candidates get executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePolicy {
    First,
    All,
}

#[derive(Debug, Clone)]
pub struct ScanPolicy {
    /// Verdicts below this confidence are treated as not spam.
    pub min_confidence: u8,
    pub candidates: CandidatePolicy,
    /// When false, candidates are discovered but nothing is executed.
    pub execute: bool,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 70,
            candidates: CandidatePolicy::First,
            execute: true,
        }
    }
}

/// What happened to one message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
    pub message_id: String,
    pub verdict: SpamVerdict,
    pub candidates: Vec<UnsubscribeCandidate>,
    /// One entry per executed candidate, in candidate order.
    pub outcomes: Vec<UnsubscribeOutcome>,
}

impl MessageReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }
}

/// Runs one message through classification and, for spam, the unsubscribe
/// engine. Only the classifier can fail this call; unsubscribe failures are
/// reported in the outcomes and recorder errors are logged.
pub async fn process_message<C>(
    classifier: &C,
    client: &UnsubscribeClient,
    recorder: Option<&dyn OutcomeRecorder>,
    message: &MailMessage,
    policy: &ScanPolicy,
) -> Result<MessageReport>
where
    C: SpamClassifier + ?Sized,
{
    let plain_text = match message.body.content_type {
        ContentType::Html => extract_text(&message.body.content),
        ContentType::Text => message.body.content.clone(),
    };
    let verdict = classifier
        .classify(&message.sender, &message.subject, &plain_text)
        .await?;

    let mut report = MessageReport {
        message_id: message.id.clone(),
        verdict,
        candidates: Vec::new(),
        outcomes: Vec::new(),
    };
    if !report.verdict.is_spam || report.verdict.confidence < policy.min_confidence {
        debug!(message_id = %message.id, confidence = report.verdict.confidence, "not treated as spam");
        return Ok(report);
    }

    report.candidates = discover_message(message);
    if !policy.execute || report.candidates.is_empty() {
        return Ok(report);
    }

    let selected = match policy.candidates {
        CandidatePolicy::First => &report.candidates[..1],
        CandidatePolicy::All => &report.candidates[..],
    };
    let mut outcomes = Vec::with_capacity(selected.len());
    for candidate in selected {
        let outcome = client.execute(candidate).await;
        if let Some(recorder) = recorder {
            if let Err(e) = recorder.record_outcome(candidate, &outcome).await {
                warn!(message_id = %message.id, url = %candidate.url, "failed to record outcome: {e}");
            }
        }
        outcomes.push(outcome);
    }
    report.outcomes = outcomes;

    info!(
        message_id = %message.id,
        attempted = report.attempted(),
        succeeded = report.succeeded(),
        "processed spam message"
    );
    Ok(report)
}
