//! Per-tick reply decisions
//!
//! A tick lists unread messages and walks them one at a time:
//!
//! 1. resolve the message's thread, skipping it when that fails
//! 2. skip threads that already hold mail sent by this account
//! 3. skip threads whose first message carries the marker label
//! 4. read the `From` header and extract the bracketed address
//! 5. send the canned reply threaded under the message, then mark the
//!    message read and labeled
//!
//! The marker label id used in step 3 is looked up once at the start of the
//! tick. A label created later in the same tick is not seen by that check;
//! the `replied` signal from step 2 still covers those threads.
//!
//! Nothing here returns an error. Every failure is logged and leaves the
//! message to be reconsidered on the next tick.

use tracing::{error, info, info_span, Instrument};

use crate::client::MailService;
use crate::config::ResponderConfig;
use crate::label_manager::MarkerLabel;
use crate::mailbox::Mailbox;
use crate::models::{MessageDetails, MessageOutcome, TickReport, UNREAD_LABEL};
use crate::reply::{compose_reply, extract_recipient};

pub struct ReplyEngine<C> {
    mailbox: Mailbox<C>,
    marker: MarkerLabel,
    settings: ResponderConfig,
}

impl<C> ReplyEngine<C>
where
    C: MailService,
{
    pub fn new(service: C, settings: ResponderConfig) -> Self {
        Self {
            mailbox: Mailbox::new(service),
            marker: MarkerLabel::new(settings.label_name.clone()),
            settings,
        }
    }

    /// Run one poll-and-reply cycle
    pub async fn run_tick(&self) -> TickReport {
        let mut report = TickReport::new();
        let span = info_span!("tick", id = %report.tick_id);

        async {
            info!("Listing unread messages");
            let unread = self.mailbox.list_unread(self.settings.max_unread).await;
            let marker_label_id = self.marker.get_label(&self.mailbox).await;
            report.unread_seen = unread.len();

            for message_id in &unread {
                let outcome = self
                    .process_message(message_id, marker_label_id.as_deref())
                    .await;
                report.record(message_id, outcome);
            }

            report.finish();
            info!(
                "Tick done: {} unread, {} replied, {} skipped, {} failed",
                report.unread_seen, report.replies_sent, report.skipped, report.failed
            );
        }
        .instrument(span)
        .await;

        report
    }

    /// Decide on and, if warranted, reply to a single unread message
    pub async fn process_message(
        &self,
        message_id: &str,
        marker_label_id: Option<&str>,
    ) -> MessageOutcome {
        let Some(thread_id) = self.mailbox.get_thread_id(message_id).await else {
            info!("Skipping message {}: thread unknown", message_id);
            return MessageOutcome::NoThread;
        };

        let replied = self.mailbox.has_replied(&thread_id).await;
        let has_auto_reply_label = self
            .mailbox
            .thread_has_label(&thread_id, marker_label_id)
            .await;

        if replied {
            info!("Skipping thread {}: already replied", thread_id);
            return MessageOutcome::AlreadyReplied;
        }
        if has_auto_reply_label {
            info!("Skipping thread {}: already auto-replied", thread_id);
            return MessageOutcome::AlreadyLabeled;
        }

        info!("Sending auto-reply to thread: {}", thread_id);

        let Some(message) = self.mailbox.get_full_message(message_id).await else {
            error!("Full message data not available for {}", message_id);
            return MessageOutcome::MessageUnavailable;
        };

        let Some(from) = message.header("From").filter(|v| !v.trim().is_empty()) else {
            error!("Original sender information not found in {}", message_id);
            return MessageOutcome::MissingSender;
        };

        let recipient = match extract_recipient(from) {
            Ok(recipient) => recipient,
            Err(e) => {
                error!("Cannot reply to {}: {}", message_id, e);
                return MessageOutcome::UnparsableSender;
            }
        };

        self.send_auto_reply(message_id, &message, &thread_id, &recipient)
            .await
    }

    /// Send the reply, then resolve the marker label and relabel the message
    async fn send_auto_reply(
        &self,
        message_id: &str,
        original: &MessageDetails,
        thread_id: &str,
        recipient: &str,
    ) -> MessageOutcome {
        let reply = compose_reply(&self.settings, original, thread_id, recipient);
        let Some(receipt) = self.mailbox.send_message(&reply).await else {
            return MessageOutcome::SendFailed;
        };
        info!("Auto-reply {} sent to {}", receipt.id, recipient);

        let label_id = self.marker.get_or_create(&self.mailbox).await;
        let add: Vec<String> = label_id.iter().cloned().collect();
        let remove = vec![UNREAD_LABEL.to_string()];

        let modified = self
            .mailbox
            .modify_message_labels(message_id, &add, &remove)
            .await;

        MessageOutcome::Replied {
            labeled: modified && label_id.is_some(),
        }
    }
}
