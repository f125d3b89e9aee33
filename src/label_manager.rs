//! Marker label lookup and lazy creation
use tracing::{debug, info, warn};

use crate::client::MailService;
use crate::mailbox::Mailbox;
use crate::models::LabelInfo;

/// Find the id of the label named exactly `name`
pub fn find_label_id(labels: &[LabelInfo], name: &str) -> Option<String> {
    labels
        .iter()
        .find(|label| label.name == name)
        .map(|label| label.id.clone())
}

/// The label recording that a thread already got its auto-reply
///
/// Nothing is cached: every lookup asks the provider, so a label created by
/// an earlier tick (or another process) is picked up instead of duplicated.
#[derive(Debug, Clone)]
pub struct MarkerLabel {
    name: String,
}

impl MarkerLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current id of the marker label, if it exists and labels could be listed
    pub async fn get_label<C: MailService>(&self, mailbox: &Mailbox<C>) -> Option<String> {
        let labels = mailbox.list_labels().await;
        let id = find_label_id(&labels, &self.name);
        if id.is_none() {
            debug!("Label '{}' not found among {} labels", self.name, labels.len());
        }
        id
    }

    /// Id of the marker label, creating the label when it does not exist yet
    ///
    /// Creation is attempted once; a failure leaves the label missing until a
    /// later send path tries again.
    pub async fn get_or_create<C: MailService>(&self, mailbox: &Mailbox<C>) -> Option<String> {
        if let Some(id) = self.get_label(mailbox).await {
            return Some(id);
        }

        match mailbox.create_label(&self.name).await {
            Some(id) => {
                info!("Label '{}' created.", self.name);
                Some(id)
            }
            None => {
                warn!("Label '{}' is still missing", self.name);
                None
            }
        }
    }
}
