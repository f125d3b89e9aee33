//! Recipient extraction and auto-reply composition

use crate::config::ResponderConfig;
use crate::error::{ResponderError, Result};
use crate::models::{MessageDetails, OutgoingReply};

/// Extract the bracketed address from a `From` header value
///
/// Takes the text between the last `<` and the last `>`, so
/// `"Jane Doe <jane@example.com>"` yields `jane@example.com`. A value with no
/// such pair, or with nothing between the brackets, is rejected.
pub fn extract_recipient(from_header: &str) -> Result<String> {
    let start = from_header.rfind('<');
    let end = from_header.rfind('>');

    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            let address = from_header[start + 1..end].trim();
            if address.is_empty() {
                Err(ResponderError::InvalidMessageFormat(format!(
                    "Empty address in From header: {:?}",
                    from_header
                )))
            } else {
                Ok(address.to_string())
            }
        }
        _ => Err(ResponderError::InvalidMessageFormat(format!(
            "No bracketed address in From header: {:?}",
            from_header
        ))),
    }
}

/// `In-Reply-To` and `References` for a reply to `original`
///
/// References carry the original's own chain followed by its `Message-ID`,
/// without duplicates.
pub fn thread_headers(original: &MessageDetails) -> (Option<String>, Vec<String>) {
    let message_id = original
        .header("Message-ID")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let mut references: Vec<String> = Vec::new();
    let chain = original.header("References").unwrap_or_default();
    for id in chain.split_whitespace().chain(message_id.as_deref()) {
        if !references.iter().any(|r| r == id) {
            references.push(id.to_string());
        }
    }

    (message_id, references)
}

/// Subject of a reply: `Re: <original subject>`, or `fallback` when the
/// original has none
pub fn reply_subject(original_subject: Option<&str>, fallback: &str) -> String {
    match original_subject.map(str::trim).filter(|s| !s.is_empty()) {
        Some(subject) if subject.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("re:")) => {
            subject.to_string()
        }
        Some(subject) => format!("Re: {}", subject),
        None => fallback.to_string(),
    }
}

/// Build the canned reply to `original`, addressed to `recipient` in `thread_id`
pub fn compose_reply(
    settings: &ResponderConfig,
    original: &MessageDetails,
    thread_id: &str,
    recipient: &str,
) -> OutgoingReply {
    let (in_reply_to, references) = thread_headers(original);
    OutgoingReply {
        thread_id: thread_id.to_string(),
        to: recipient.to_string(),
        from: settings.from_address.clone(),
        subject: reply_subject(original.header("Subject"), &settings.reply_subject),
        body: settings.reply_body.clone(),
        in_reply_to,
        references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageHeader;
    use proptest::prelude::*;

    #[test]
    fn test_extract_recipient_display_name() {
        assert_eq!(
            extract_recipient("Jane Doe <jane@example.com>").unwrap(),
            "jane@example.com"
        );
        assert_eq!(
            extract_recipient("\"Doe, Jane\" <jane@example.com>").unwrap(),
            "jane@example.com"
        );
        assert_eq!(extract_recipient("<bob@example.org>").unwrap(), "bob@example.org");
    }

    #[test]
    fn test_extract_recipient_uses_last_brackets() {
        assert_eq!(
            extract_recipient("Team <list> via Groups <groups@example.com>").unwrap(),
            "groups@example.com"
        );
    }

    #[test]
    fn test_extract_recipient_without_brackets() {
        let err = extract_recipient("jane@example.com").unwrap_err();
        assert!(matches!(err, ResponderError::InvalidMessageFormat(_)));
        assert!(extract_recipient("").is_err());
    }

    #[test]
    fn test_extract_recipient_malformed_brackets() {
        assert!(extract_recipient("Jane <jane@example.com").is_err());
        assert!(extract_recipient("Jane jane@example.com>").is_err());
        assert!(extract_recipient("Jane >jane@example.com<").is_err());
        assert!(extract_recipient("Jane < >").is_err());
    }

    fn original(headers: &[(&str, &str)]) -> MessageDetails {
        MessageDetails {
            id: "m2".to_string(),
            thread_id: Some("thread-1".to_string()),
            label_ids: vec!["UNREAD".to_string()],
            headers: headers
                .iter()
                .map(|(name, value)| MessageHeader {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_compose_reply_threads_under_original() {
        let settings = ResponderConfig::default();
        let message = original(&[
            ("Subject", "Lunch?"),
            ("Message-ID", "<m2@mail.example.com>"),
            ("References", "<m0@mail.example.com> <m1@mail.example.com>"),
        ]);
        let reply = compose_reply(&settings, &message, "thread-1", "jane@example.com");

        assert_eq!(reply.thread_id, "thread-1");
        assert_eq!(reply.to, "jane@example.com");
        assert_eq!(reply.subject, "Re: Lunch?");
        assert_eq!(reply.body, settings.reply_body);
        assert_eq!(reply.from, None);
        assert_eq!(reply.in_reply_to.as_deref(), Some("<m2@mail.example.com>"));
        assert_eq!(
            reply.references,
            vec![
                "<m0@mail.example.com>",
                "<m1@mail.example.com>",
                "<m2@mail.example.com>"
            ]
        );
    }

    #[test]
    fn test_compose_reply_without_subject_or_message_id() {
        let settings = ResponderConfig::default();
        let reply = compose_reply(&settings, &original(&[]), "thread-1", "jane@example.com");

        assert_eq!(reply.subject, settings.reply_subject);
        assert_eq!(reply.in_reply_to, None);
        assert!(reply.references.is_empty());
    }

    #[test]
    fn test_thread_headers_dedup() {
        let message = original(&[
            ("message-id", " <m1@mail.example.com> "),
            ("References", "<m1@mail.example.com>"),
        ]);
        let (in_reply_to, references) = thread_headers(&message);
        assert_eq!(in_reply_to.as_deref(), Some("<m1@mail.example.com>"));
        assert_eq!(references, vec!["<m1@mail.example.com>"]);
    }

    #[test]
    fn test_reply_subject() {
        let fallback = "Re: On Vacation Auto Reply";
        assert_eq!(reply_subject(Some("Lunch?"), fallback), "Re: Lunch?");
        assert_eq!(reply_subject(Some("RE: Lunch?"), fallback), "RE: Lunch?");
        assert_eq!(reply_subject(Some("re: Lunch?"), fallback), "re: Lunch?");
        assert_eq!(reply_subject(Some("   "), fallback), fallback);
        assert_eq!(reply_subject(None, fallback), fallback);
        // Multi-byte subjects shorter than the prefix
        assert_eq!(reply_subject(Some("é"), fallback), "Re: é");
    }

    proptest! {
        #[test]
        fn prop_extracts_bracketed_address(
            name in "[A-Za-z ]{0,20}",
            local in "[a-z0-9.]{1,12}",
            domain in "[a-z]{1,10}\\.(com|org|net)",
        ) {
            let address = format!("{}@{}", local, domain);
            let header = format!("{} <{}>", name, address);
            prop_assert_eq!(extract_recipient(&header).unwrap(), address);
        }

        #[test]
        fn prop_rejects_headers_without_angle_brackets(header in "[^<>]*") {
            prop_assert!(extract_recipient(&header).is_err());
        }
    }
}
