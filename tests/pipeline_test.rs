use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use unsubscribe_client_rs::models::{ContentType, MessageBody, Sender};
use unsubscribe_client_rs::{
    process_message, CandidatePolicy, Config, Error, MailMessage, OutcomeRecorder, ScanPolicy,
    SpamClassifier, SpamVerdict, UnsubscribeCandidate, UnsubscribeClient, UnsubscribeOutcome,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

struct FixedClassifier {
    is_spam: bool,
    confidence: u8,
    seen_text: Mutex<Vec<String>>,
}

impl FixedClassifier {
    fn new(is_spam: bool, confidence: u8) -> Self {
        Self {
            is_spam,
            confidence,
            seen_text: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpamClassifier for FixedClassifier {
    async fn classify(
        &self,
        _sender: &Sender,
        _subject: &str,
        plain_text_body: &str,
    ) -> unsubscribe_client_rs::Result<SpamVerdict> {
        self.seen_text.lock().unwrap().push(plain_text_body.to_string());
        Ok(SpamVerdict {
            is_spam: self.is_spam,
            confidence: self.confidence,
            reasoning: "fixed".into(),
        })
    }
}

struct FailingClassifier;

#[async_trait]
impl SpamClassifier for FailingClassifier {
    async fn classify(&self, _: &Sender, _: &str, _: &str) -> unsubscribe_client_rs::Result<SpamVerdict> {
        Err(Error::Collaborator("classifier offline".into()))
    }
}

#[derive(Default)]
struct MemoryRecorder {
    records: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl OutcomeRecorder for MemoryRecorder {
    async fn record_outcome(
        &self,
        candidate: &UnsubscribeCandidate,
        outcome: &UnsubscribeOutcome,
    ) -> unsubscribe_client_rs::Result<()> {
        self.records
            .lock()
            .unwrap()
            .push((candidate.url.clone(), outcome.succeeded));
        Ok(())
    }
}

fn message(body: String) -> MailMessage {
    MailMessage {
        id: "msg-1".into(),
        subject: "Deals you can't miss".into(),
        sender: Sender {
            address: "deals@shop.example".into(),
            name: Some("Shop".into()),
        },
        body: MessageBody {
            content: body,
            content_type: ContentType::Html,
        },
        received_at: Utc::now(),
        list_unsubscribe: None,
    }
}

fn client() -> UnsubscribeClient {
    UnsubscribeClient::new(Some(Config::default().with_system_proxy(false))).unwrap()
}

async fn confirming_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/u"))
        .respond_with(ResponseTemplate::new(200).set_body_string("You have been unsubscribed."))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn spam_messages_get_unsubscribed_and_recorded() {
    let server = confirming_server().await;
    let body = format!(
        r#"<style>.x{{}}</style><p>Big sale!</p><a href="{}/u">Unsubscribe</a>"#,
        server.uri()
    );
    let classifier = FixedClassifier::new(true, 95);
    let recorder = MemoryRecorder::default();

    let report = process_message(
        &classifier,
        &client(),
        Some(&recorder),
        &message(body),
        &ScanPolicy::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.candidates.len(), 1);
    assert_eq!(report.attempted(), 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(classifier.seen_text.lock().unwrap()[0], "Big sale! Unsubscribe");
    let records = recorder.records.lock().unwrap();
    assert_eq!(*records, vec![(format!("{}/u", server.uri()), true)]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["message_id"], "msg-1");
    assert_eq!(json["candidates"][0]["kind"], "link");
    assert_eq!(json["outcomes"][0]["method"], "get");
    assert!(json["outcomes"][0]["failure"].is_null());
}

#[tokio::test]
async fn low_confidence_skips_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let body = format!(r#"<a href="{}/u">Unsubscribe</a>"#, server.uri());

    let report = process_message(
        &FixedClassifier::new(true, 40),
        &client(),
        None,
        &message(body),
        &ScanPolicy::default(),
    )
    .await
    .unwrap();

    assert!(report.candidates.is_empty());
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn dry_run_discovers_without_executing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let mut msg = message(format!(r#"<a href="{}/u">Unsubscribe</a>"#, server.uri()));
    msg.list_unsubscribe = Some("<mailto:leave@shop.example>".into());
    let policy = ScanPolicy {
        execute: false,
        ..ScanPolicy::default()
    };

    let report = process_message(&FixedClassifier::new(true, 99), &client(), None, &msg, &policy)
        .await
        .unwrap();

    assert_eq!(report.candidates.len(), 2);
    assert_eq!(report.candidates[0].url, "mailto:leave@shop.example");
    assert_eq!(report.attempted(), 0);
}

#[tokio::test]
async fn all_policy_runs_every_candidate() {
    let server = confirming_server().await;
    let body = format!(
        r#"<a href="{}/u">Unsubscribe</a> or mailto:unsubscribe@shop.example"#,
        server.uri()
    );
    let policy = ScanPolicy {
        candidates: CandidatePolicy::All,
        ..ScanPolicy::default()
    };

    let report = process_message(&FixedClassifier::new(true, 80), &client(), None, &message(body), &policy)
        .await
        .unwrap();

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.succeeded(), 2);
}

#[tokio::test]
async fn classifier_errors_propagate() {
    let result = process_message(
        &FailingClassifier,
        &client(),
        None,
        &message("<p>hi</p>".into()),
        &ScanPolicy::default(),
    )
    .await;

    assert!(matches!(result, Err(Error::Collaborator(_))));
}
