//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use gmail_vacation_responder::client::MailService;
use gmail_vacation_responder::error::{ResponderError, Result};
use gmail_vacation_responder::models::{
    LabelInfo, MessageDetails, MessageHeader, OutgoingReply, SentReceipt, ThreadMessage,
    ThreadSummary, UNREAD_LABEL,
};
use gmail_vacation_responder::{ReplyEngine, ResponderConfig};
use mockall::mock;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

pub const MARKER: &str = "Vacation Auto Replies";

pub fn message_id_header(id: &str) -> String {
    format!("<{}@mail.example.com>", id)
}

/// Message carrying `From`, `Subject` and `Message-ID` headers
pub fn message_from(id: &str, thread_id: &str, from: &str) -> MessageDetails {
    MessageDetails {
        id: id.to_string(),
        thread_id: Some(thread_id.to_string()),
        label_ids: vec!["INBOX".to_string(), UNREAD_LABEL.to_string()],
        headers: vec![
            MessageHeader {
                name: "Subject".to_string(),
                value: "Quick question".to_string(),
            },
            MessageHeader {
                name: "From".to_string(),
                value: from.to_string(),
            },
            MessageHeader {
                name: "Message-ID".to_string(),
                value: message_id_header(id),
            },
        ],
    }
}

/// Subject with any leading `Re:` prefixes removed
fn base_subject(subject: &str) -> &str {
    let mut rest = subject.trim();
    while rest.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("re:")) {
        rest = rest[3..].trim_start();
    }
    rest
}

/// Message with no headers at all
pub fn message_without_sender(id: &str, thread_id: &str) -> MessageDetails {
    MessageDetails {
        id: id.to_string(),
        thread_id: Some(thread_id.to_string()),
        label_ids: vec![UNREAD_LABEL.to_string()],
        headers: vec![],
    }
}

pub fn thread_with_labels(thread_id: &str, first_labels: &[&str]) -> ThreadSummary {
    ThreadSummary {
        id: thread_id.to_string(),
        messages: vec![ThreadMessage {
            id: format!("{}-first", thread_id),
            label_ids: first_labels.iter().map(|l| l.to_string()).collect(),
        }],
    }
}

pub fn marker_label(id: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: MARKER.to_string(),
    }
}

pub fn server_error() -> ResponderError {
    ResponderError::ServerError {
        status: 503,
        message: "Service unavailable".to_string(),
    }
}

pub fn engine<C: MailService>(service: C) -> ReplyEngine<C> {
    ReplyEngine::new(service, ResponderConfig::default())
}

// Mock implementation of MailService for testing
mock! {
    pub MailService {}

    #[async_trait]
    impl MailService for MailService {
        async fn list_message_ids(&self, query: &str, max_results: Option<u32>) -> Result<Vec<String>>;
        async fn get_message(&self, id: &str) -> Result<MessageDetails>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn create_label(&self, name: &str) -> Result<String>;
        async fn send_message(&self, reply: &OutgoingReply) -> Result<SentReceipt>;
        async fn modify_message_labels(
            &self,
            message_id: &str,
            add_label_ids: &[String],
            remove_label_ids: &[String],
        ) -> Result<MessageDetails>;
        async fn get_thread(&self, thread_id: &str) -> Result<ThreadSummary>;
    }
}

#[derive(Default)]
struct FakeState {
    messages: Vec<MessageDetails>,
    labels: Vec<LabelInfo>,
    /// Each sent reply with the thread Gmail filed it under
    sent: Vec<(OutgoingReply, String)>,
    label_creations: usize,
    failing_messages: HashSet<String>,
}

/// In-memory mailbox that behaves like the provider across calls
///
/// A sent reply joins its requested thread only when it names a message of
/// that thread in `In-Reply-To`/`References` and keeps that message's
/// subject; otherwise it starts a new thread, as Gmail does. Replies show up
/// in the `in:sent` query for the thread they landed in, label changes
/// stick, and creating a label whose name exists fails. Every call first
/// waits `latency` (or yields when zero) so concurrent ticks interleave at
/// each remote call.
#[derive(Default)]
pub struct FakeMailService {
    state: Mutex<FakeState>,
    latency: Duration,
}

impl FakeMailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_unread(self, id: &str, thread_id: &str, from: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .messages
            .push(message_from(id, thread_id, from));
        self
    }

    pub fn with_message(self, message: MessageDetails) -> Self {
        self.state.lock().unwrap().messages.push(message);
        self
    }

    pub fn with_label(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().labels.push(LabelInfo {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn failing_message(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_messages
            .insert(id.to_string());
        self
    }

    /// New unread mail arriving while the service is in use
    pub fn deliver(&self, id: &str, thread_id: &str, from: &str) {
        self.state
            .lock()
            .unwrap()
            .messages
            .push(message_from(id, thread_id, from));
    }

    pub fn sent(&self) -> Vec<OutgoingReply> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|(reply, _)| reply.clone())
            .collect()
    }

    /// Threads the sent replies were filed under
    pub fn sent_threads(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|(_, thread)| thread.clone())
            .collect()
    }

    pub fn label_creations(&self) -> usize {
        self.state.lock().unwrap().label_creations
    }

    pub fn labels_named(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .labels
            .iter()
            .filter(|l| l.name == name)
            .count()
    }

    pub fn message_labels(&self, id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.label_ids.clone())
            .unwrap_or_default()
    }

    async fn wait(&self) {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl MailService for FakeMailService {
    async fn list_message_ids(&self, query: &str, max_results: Option<u32>) -> Result<Vec<String>> {
        self.wait().await;
        let state = self.state.lock().unwrap();
        let limit = max_results.map(|m| m as usize).unwrap_or(usize::MAX);

        if query == "is:unread" {
            return Ok(state
                .messages
                .iter()
                .filter(|m| m.is_unread())
                .take(limit)
                .map(|m| m.id.clone())
                .collect());
        }

        if let Some(thread_id) = query.strip_prefix("in:sent from:me thread:") {
            return Ok(state
                .sent
                .iter()
                .enumerate()
                .filter(|(_, (_, filed_under))| filed_under == thread_id)
                .take(limit)
                .map(|(i, _)| format!("sent-{}", i))
                .collect());
        }

        Ok(Vec::new())
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetails> {
        self.wait().await;
        let state = self.state.lock().unwrap();
        if state.failing_messages.contains(id) {
            return Err(server_error());
        }
        state
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ResponderError::NotFound(id.to_string()))
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        self.wait().await;
        Ok(self.state.lock().unwrap().labels.clone())
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        self.wait().await;
        let mut state = self.state.lock().unwrap();
        state.label_creations += 1;
        if state.labels.iter().any(|l| l.name == name) {
            return Err(ResponderError::ApiError(
                "HTTP 409: Label name exists or conflicts".to_string(),
            ));
        }
        let id = format!("Label_{}", state.labels.len() + 1);
        state.labels.push(LabelInfo {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn send_message(&self, reply: &OutgoingReply) -> Result<SentReceipt> {
        self.wait().await;
        let mut state = self.state.lock().unwrap();

        let threaded = state.messages.iter().any(|m| {
            let referenced = m.header("Message-ID").is_some_and(|id| {
                reply.in_reply_to.as_deref() == Some(id) || reply.references.iter().any(|r| r == id)
            });
            let same_subject = m
                .header("Subject")
                .is_some_and(|subject| base_subject(subject) == base_subject(&reply.subject));
            m.thread_id.as_deref() == Some(reply.thread_id.as_str()) && referenced && same_subject
        });
        let filed_under = if threaded {
            reply.thread_id.clone()
        } else {
            format!("new-thread-{}", state.sent.len())
        };

        state.sent.push((reply.clone(), filed_under.clone()));
        Ok(SentReceipt {
            id: format!("sent-{}", state.sent.len() - 1),
            thread_id: Some(filed_under),
        })
    }

    async fn modify_message_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<MessageDetails> {
        self.wait().await;
        let mut state = self.state.lock().unwrap();
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ResponderError::NotFound(message_id.to_string()))?;

        message.label_ids.retain(|l| !remove_label_ids.contains(l));
        for label in add_label_ids {
            if !message.label_ids.contains(label) {
                message.label_ids.push(label.clone());
            }
        }
        Ok(message.clone())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<ThreadSummary> {
        self.wait().await;
        let state = self.state.lock().unwrap();
        let messages: Vec<ThreadMessage> = state
            .messages
            .iter()
            .filter(|m| m.thread_id.as_deref() == Some(thread_id))
            .map(|m| ThreadMessage {
                id: m.id.clone(),
                label_ids: m.label_ids.clone(),
            })
            .collect();

        if messages.is_empty() {
            return Err(ResponderError::NotFound(thread_id.to_string()));
        }
        Ok(ThreadSummary {
            id: thread_id.to_string(),
            messages,
        })
    }
}
