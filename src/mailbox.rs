//! Failure-tolerant view of the mail service
//!
//! Each remote call is wrapped so that an error is logged and replaced by the
//! value that makes the caller do nothing destructive: an empty list, `None`,
//! or `false`. One failed call therefore never aborts a whole tick.

use tracing::{error, warn};

use crate::client::{sent_in_thread_query, MailService};
use crate::error::{ErrorKind, ResponderError};
use crate::models::{LabelInfo, MessageDetails, OutgoingReply, SentReceipt};

/// Query for the messages a tick considers
pub const UNREAD_QUERY: &str = "is:unread";

pub struct Mailbox<C> {
    service: C,
}

impl<C> Mailbox<C>
where
    C: MailService,
{
    pub fn new(service: C) -> Self {
        Self { service }
    }

    /// IDs of unread messages, empty when listing fails
    pub async fn list_unread(&self, max_results: u32) -> Vec<String> {
        match self
            .service
            .list_message_ids(UNREAD_QUERY, Some(max_results))
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                report_failure("Error listing unread messages", &e);
                Vec::new()
            }
        }
    }

    pub async fn get_thread_id(&self, message_id: &str) -> Option<String> {
        match self.service.get_message(message_id).await {
            Ok(message) => {
                if message.thread_id.is_none() {
                    warn!("Message {} has no thread id", message_id);
                }
                message.thread_id
            }
            Err(e) => {
                report_failure(&format!("Error getting thread of message {}", message_id), &e);
                None
            }
        }
    }

    pub async fn list_sent_in_thread(&self, thread_id: &str) -> Vec<String> {
        match self
            .service
            .list_message_ids(&sent_in_thread_query(thread_id), None)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                report_failure(&format!("Error listing sent messages in thread {}", thread_id), &e);
                Vec::new()
            }
        }
    }

    /// Whether this account already sent mail into the thread
    pub async fn has_replied(&self, thread_id: &str) -> bool {
        !self.list_sent_in_thread(thread_id).await.is_empty()
    }

    /// Full message with headers; `None` means "unavailable"
    pub async fn get_full_message(&self, message_id: &str) -> Option<MessageDetails> {
        match self.service.get_message(message_id).await {
            Ok(message) => Some(message),
            Err(e) => {
                report_failure(&format!("Error fetching message {}", message_id), &e);
                None
            }
        }
    }

    pub async fn list_labels(&self) -> Vec<LabelInfo> {
        match self.service.list_labels().await {
            Ok(labels) => labels,
            Err(e) => {
                report_failure("Error fetching labels", &e);
                Vec::new()
            }
        }
    }

    pub async fn create_label(&self, name: &str) -> Option<String> {
        match self.service.create_label(name).await {
            Ok(id) => Some(id),
            Err(e) => {
                report_failure(&format!("Error creating label '{}'", name), &e);
                None
            }
        }
    }

    pub async fn send_message(&self, reply: &OutgoingReply) -> Option<SentReceipt> {
        match self.service.send_message(reply).await {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                report_failure(
                    &format!(
                        "Error sending auto-reply to {} in thread {}",
                        reply.to, reply.thread_id
                    ),
                    &e,
                );
                None
            }
        }
    }

    /// Returns false when the modification failed
    pub async fn modify_message_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> bool {
        match self
            .service
            .modify_message_labels(message_id, add_label_ids, remove_label_ids)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                report_failure(&format!("Error modifying labels on message {}", message_id), &e);
                false
            }
        }
    }

    /// Whether the thread's first message carries `label_id`
    ///
    /// An unresolved label id yields `false`, as does any failure to read the
    /// thread. Both bias toward replying again rather than skipping silently.
    pub async fn thread_has_label(&self, thread_id: &str, label_id: Option<&str>) -> bool {
        let Some(label_id) = label_id else {
            error!("Label ID not found.");
            return false;
        };

        match self.service.get_thread(thread_id).await {
            Ok(thread) => thread.first_message_has_label(label_id),
            Err(e) => {
                report_failure(&format!("Error checking label on thread {}", thread_id), &e);
                false
            }
        }
    }
}

/// Log a degraded call, tagged with the error's kind
///
/// Auth failures here mean the refresh token stopped working after startup;
/// every later call will fail the same way until it is replaced.
fn report_failure(action: &str, e: &ResponderError) {
    let kind = e.kind();
    error!(?kind, "{}: {}", action, e);
    if kind == ErrorKind::Auth {
        warn!("Gmail rejected the stored credentials; re-authorize and replace the token file");
    }
}
