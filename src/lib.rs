pub mod client;
pub mod collaborators;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod html;
pub mod mailto;
pub mod models;
pub mod patterns;
pub mod pipeline;

pub use client::{UnsubscribeClient, UnsubscribeClientBuilder};
pub use collaborators::{MailFetcher, OutcomeRecorder, SpamClassifier};
pub use constants::{default_headers, default_timeout, DEFAULT_HEADERS, DEFAULT_TIMEOUT_SECS};
pub use discovery::{discover, discover_from_header, discover_message};
pub use error::{Error, FailureKind, Result};
pub use html::extract_text;
pub use models::{
    CandidateKind, CandidateSource, Config, MailMessage, OutcomeStatus, SpamVerdict,
    UnsubscribeCandidate, UnsubscribeMethod, UnsubscribeOutcome,
};
pub use pipeline::{process_message, CandidatePolicy, MessageReport, ScanPolicy};

/// Unsubscribe candidates found in an email body.
pub fn discover_unsubscribe_candidates(email_body_html: &str) -> Vec<UnsubscribeCandidate> {
    discover(email_body_html)
}

/// Executes one candidate with a throwaway client.
pub async fn execute_unsubscribe(
    candidate: &UnsubscribeCandidate,
    config: Option<Config>,
) -> UnsubscribeOutcome {
    match UnsubscribeClient::new(config) {
        Ok(client) => client.execute(candidate).await,
        Err(e) => UnsubscribeOutcome::failure(
            UnsubscribeMethod::Get,
            e.failure_kind(),
            format!("Could not set up HTTP client: {e}"),
            None,
        ),
    }
}
