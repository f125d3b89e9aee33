//! Gmail API operations used by the responder

use async_trait::async_trait;
use google_gmail1::{
    api::{Label, Message, ModifyMessageRequest},
    common::Connector,
    Gmail,
};
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ResponderError, Result};
use crate::models::{LabelInfo, MessageDetails, OutgoingReply, SentReceipt, ThreadSummary};

const USER_ID: &str = "me";
const MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";
const LABELS_SCOPE: &str = "https://www.googleapis.com/auth/gmail.labels";

/// Query selecting mail this account sent into a thread
pub fn sent_in_thread_query(thread_id: &str) -> String {
    format!("in:sent from:me thread:{}", thread_id)
}

/// Remote mailbox operations, one method per API call
///
/// Every method can fail on its own; degrading failures to safe values is
/// the job of [`crate::mailbox::Mailbox`].
#[async_trait]
pub trait MailService: Send + Sync {
    /// List message IDs matching a query, at most `max_results`
    async fn list_message_ids(&self, query: &str, max_results: Option<u32>) -> Result<Vec<String>>;

    /// Get a message with its headers and label ids
    async fn get_message(&self, id: &str) -> Result<MessageDetails>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a new label, returning its ID
    async fn create_label(&self, name: &str) -> Result<String>;

    /// Send a reply into its thread
    async fn send_message(&self, reply: &OutgoingReply) -> Result<SentReceipt>;

    /// Add and remove labels on a single message
    async fn modify_message_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<MessageDetails>;

    /// Get a thread with the label ids of its messages
    async fn get_thread(&self, thread_id: &str) -> Result<ThreadSummary>;
}

/// Gmail-backed [`MailService`] for the `me` mailbox
///
/// Calls are not retried. Each one is bounded by `request_timeout`, which
/// is the only limit on how long a tick can wait for the provider.
pub struct GmailMailService<C> {
    hub: Gmail<C>,
    request_timeout: Duration,
}

impl<C> GmailMailService<C>
where
    C: Connector,
{
    pub fn new(hub: Gmail<C>, request_timeout: Duration) -> Self {
        Self {
            hub,
            request_timeout,
        }
    }

    async fn call<T, F>(&self, operation: &str, api_call: F) -> Result<T>
    where
        F: Future<Output = google_gmail1::Result<(google_gmail1::common::Response, T)>>,
    {
        debug!("Calling Gmail API: {}", operation);
        match tokio::time::timeout(self.request_timeout, api_call).await {
            Ok(Ok((_, value))) => Ok(value),
            Ok(Err(e)) => Err(ResponderError::from(e)),
            Err(_) => {
                warn!(
                    "Gmail API {} call timed out after {:?}",
                    operation, self.request_timeout
                );
                Err(ResponderError::NetworkError(format!(
                    "{} timed out after {:?}",
                    operation, self.request_timeout
                )))
            }
        }
    }
}

fn non_empty(ids: &[String]) -> Option<Vec<String>> {
    if ids.is_empty() {
        None
    } else {
        Some(ids.to_vec())
    }
}

#[async_trait]
impl<C> MailService for GmailMailService<C>
where
    C: Connector,
{
    async fn list_message_ids(&self, query: &str, max_results: Option<u32>) -> Result<Vec<String>> {
        let mut call = self.hub.users().messages_list(USER_ID).q(query);
        if let Some(max) = max_results {
            call = call.max_results(max);
        }

        let response = self
            .call("messages.list", call.add_scope(MODIFY_SCOPE).doit())
            .await?;

        Ok(response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect())
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetails> {
        let call = self
            .hub
            .users()
            .messages_get(USER_ID, id)
            .format("metadata")
            .add_metadata_headers("From")
            .add_metadata_headers("Subject")
            .add_metadata_headers("Message-ID")
            .add_metadata_headers("References")
            .add_scope(MODIFY_SCOPE)
            .doit();

        let message = self.call("messages.get", call).await?;
        if message.id.is_none() {
            return Err(ResponderError::InvalidMessageFormat(format!(
                "Message {} returned without an id",
                id
            )));
        }
        Ok(MessageDetails::from(message))
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let call = self
            .hub
            .users()
            .labels_list(USER_ID)
            .add_scope(LABELS_SCOPE)
            .doit();

        let response = self.call("labels.list", call).await?;
        let labels: Vec<LabelInfo> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| match (label.id, label.name) {
                (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                _ => None,
            })
            .collect();

        debug!("Fetched {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        let label = Label {
            name: Some(name.to_string()),
            message_list_visibility: Some("show".to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            ..Default::default()
        };

        let call = self
            .hub
            .users()
            .labels_create(label, USER_ID)
            .add_scope(LABELS_SCOPE)
            .doit();

        let created = self.call("labels.create", call).await?;
        created
            .id
            .ok_or_else(|| ResponderError::LabelError("Created label has no ID".to_string()))
    }

    async fn send_message(&self, reply: &OutgoingReply) -> Result<SentReceipt> {
        let metadata = Message {
            thread_id: Some(reply.thread_id.clone()),
            ..Default::default()
        };
        let rfc822: mime::Mime = "message/rfc822".parse().map_err(|e| {
            ResponderError::InvalidMessageFormat(format!("Invalid upload media type: {}", e))
        })?;
        let raw = Cursor::new(reply.to_rfc822().into_bytes());

        let call = self
            .hub
            .users()
            .messages_send(metadata, USER_ID)
            .add_scope(MODIFY_SCOPE)
            .upload(raw, rfc822);

        let sent = self.call("messages.send", call).await?;
        Ok(SentReceipt {
            id: sent.id.unwrap_or_default(),
            thread_id: sent.thread_id,
        })
    }

    async fn modify_message_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<MessageDetails> {
        let request = ModifyMessageRequest {
            add_label_ids: non_empty(add_label_ids),
            remove_label_ids: non_empty(remove_label_ids),
        };

        let call = self
            .hub
            .users()
            .messages_modify(request, USER_ID, message_id)
            .add_scope(MODIFY_SCOPE)
            .doit();

        let message = self.call("messages.modify", call).await?;
        Ok(MessageDetails::from(message))
    }

    async fn get_thread(&self, thread_id: &str) -> Result<ThreadSummary> {
        let call = self
            .hub
            .users()
            .threads_get(USER_ID, thread_id)
            .format("minimal")
            .add_scope(MODIFY_SCOPE)
            .doit();

        let thread = self.call("threads.get", call).await?;
        Ok(ThreadSummary::from(thread))
    }
}

// Allow sharing one service between the engine and tests
#[async_trait]
impl<T> MailService for Arc<T>
where
    T: MailService + ?Sized,
{
    async fn list_message_ids(&self, query: &str, max_results: Option<u32>) -> Result<Vec<String>> {
        self.as_ref().list_message_ids(query, max_results).await
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetails> {
        self.as_ref().get_message(id).await
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        self.as_ref().list_labels().await
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        self.as_ref().create_label(name).await
    }

    async fn send_message(&self, reply: &OutgoingReply) -> Result<SentReceipt> {
        self.as_ref().send_message(reply).await
    }

    async fn modify_message_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<MessageDetails> {
        self.as_ref()
            .modify_message_labels(message_id, add_label_ids, remove_label_ids)
            .await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<ThreadSummary> {
        self.as_ref().get_thread(thread_id).await
    }
}
