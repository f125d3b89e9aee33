use chrono::{DateTime, Utc};
use google_gmail1::api::{Message, Thread};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gmail system label marking a message as unread
pub const UNREAD_LABEL: &str = "UNREAD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// A message as returned by `messages.get`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetails {
    pub id: String,
    pub thread_id: Option<String>,
    pub label_ids: Vec<String>,
    pub headers: Vec<MessageHeader>,
}

impl MessageDetails {
    /// First header value with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn is_unread(&self) -> bool {
        self.label_ids.iter().any(|l| l == UNREAD_LABEL)
    }
}

impl From<Message> for MessageDetails {
    fn from(msg: Message) -> Self {
        let headers = msg
            .payload
            .and_then(|p| p.headers)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|h| match (h.name, h.value) {
                (Some(name), Some(value)) => Some(MessageHeader { name, value }),
                _ => None,
            })
            .collect();

        Self {
            id: msg.id.unwrap_or_default(),
            thread_id: msg.thread_id,
            label_ids: msg.label_ids.unwrap_or_default(),
            headers,
        }
    }
}

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub label_ids: Vec<String>,
}

/// A conversation with the label sets of its messages, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub messages: Vec<ThreadMessage>,
}

impl ThreadSummary {
    /// Whether the thread's first message carries `label_id`
    pub fn first_message_has_label(&self, label_id: &str) -> bool {
        self.messages
            .first()
            .map(|m| m.label_ids.iter().any(|l| l == label_id))
            .unwrap_or(false)
    }
}

impl From<Thread> for ThreadSummary {
    fn from(thread: Thread) -> Self {
        let messages = thread
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| ThreadMessage {
                id: m.id.unwrap_or_default(),
                label_ids: m.label_ids.unwrap_or_default(),
            })
            .collect();

        Self {
            id: thread.id.unwrap_or_default(),
            messages,
        }
    }
}

/// A plain-text reply posted into an existing thread
///
/// Gmail files a sent message into `thread_id` only when `In-Reply-To` or
/// `References` name a message of that thread and the subject matches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingReply {
    pub thread_id: String,
    pub to: String,
    pub from: Option<String>,
    pub subject: String,
    pub body: String,
    /// `Message-ID` of the message being answered
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
}

impl OutgoingReply {
    /// Render as an RFC 5322 message. Gmail fills in `From` when it is omitted.
    pub fn to_rfc822(&self) -> String {
        let mut raw = String::new();
        if let Some(from) = &self.from {
            raw.push_str(&format!("From: {}\r\n", from));
        }
        raw.push_str(&format!("To: {}\r\n", self.to));
        raw.push_str(&format!("Subject: {}\r\n", self.subject));
        if let Some(in_reply_to) = &self.in_reply_to {
            raw.push_str(&format!("In-Reply-To: {}\r\n", in_reply_to));
        }
        if !self.references.is_empty() {
            raw.push_str(&format!("References: {}\r\n", self.references.join(" ")));
        }
        raw.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        raw.push_str(&self.body);
        raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReceipt {
    pub id: String,
    pub thread_id: Option<String>,
}

/// What happened to one unread message during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageOutcome {
    /// Thread id could not be resolved
    NoThread,
    /// The thread already contains mail sent from this account
    AlreadyReplied,
    /// The thread already carries the marker label
    AlreadyLabeled,
    /// The full message could not be fetched
    MessageUnavailable,
    /// No `From` header on the message
    MissingSender,
    /// `From` header holds no bracketed address
    UnparsableSender,
    /// The reply could not be sent
    SendFailed,
    /// Reply sent; `labeled` is false when the marker label could not be applied
    Replied { labeled: bool },
}

impl MessageOutcome {
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            MessageOutcome::NoThread | MessageOutcome::AlreadyReplied | MessageOutcome::AlreadyLabeled
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            MessageOutcome::MessageUnavailable
                | MessageOutcome::MissingSender
                | MessageOutcome::UnparsableSender
                | MessageOutcome::SendFailed
        )
    }
}

/// Summary of a single poll-and-reply cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub tick_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub unread_seen: usize,
    pub replies_sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<(String, MessageOutcome)>,
}

impl TickReport {
    pub fn new() -> Self {
        Self {
            tick_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            unread_seen: 0,
            replies_sent: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, message_id: &str, outcome: MessageOutcome) {
        if let MessageOutcome::Replied { .. } = outcome {
            self.replies_sent += 1;
        } else if outcome.is_skip() {
            self.skipped += 1;
        } else if outcome.is_failure() {
            self.failed += 1;
        }
        self.outcomes.push((message_id.to_string(), outcome));
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn outcome_for(&self, message_id: &str) -> Option<MessageOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == message_id)
            .map(|(_, outcome)| *outcome)
    }
}

impl Default for TickReport {
    fn default() -> Self {
        Self::new()
    }
}
