//! Interfaces to the services around the engine: mail fetching, spam
//! classification and outcome storage. Implementations live with the caller.

use crate::error::Result;
use crate::models::{MailMessage, Provider, Sender, SpamVerdict, UnsubscribeCandidate, UnsubscribeOutcome};
use async_trait::async_trait;

/// Fetches candidate spam messages from a connected account.
#[async_trait]
pub trait MailFetcher: Send + Sync {
    fn provider(&self) -> Provider;

    /// Messages from the given folders, or the provider's junk folder when empty.
    async fn spam_messages(&self, folders: &[String]) -> Result<Vec<MailMessage>>;
}

/// Black-box spam classifier.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn classify(&self, sender: &Sender, subject: &str, plain_text_body: &str)
        -> Result<SpamVerdict>;
}

/// Persists what happened to each candidate.
#[async_trait]
pub trait OutcomeRecorder: Send + Sync {
    async fn record_outcome(
        &self,
        candidate: &UnsubscribeCandidate,
        outcome: &UnsubscribeOutcome,
    ) -> Result<()>;
}
