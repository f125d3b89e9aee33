//! Gmail Vacation Responder
//!
//! Polls a Gmail mailbox for unread messages and answers each conversation
//! once with a canned vacation reply, tagging answered messages with a marker
//! label.
//!
//! # Overview
//!
//! - **Authorization**: refresh-token OAuth2 against the Gmail API
//! - **Mail service**: thin Gmail calls behind the [`MailService`] trait
//! - **Mailbox**: the same calls, degraded to safe values on failure
//! - **Engine**: per-message reply decisions for one tick
//! - **Scheduler**: fires ticks at random intervals, forever
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_vacation_responder::{auth, config::Config, GmailMailService, ReplyEngine, Scheduler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::authorize("credentials.json".as_ref(), "token.json".as_ref()).await?;
//!     let service = GmailMailService::new(hub, config.client.request_timeout());
//!
//!     let engine = Arc::new(ReplyEngine::new(service, config.responder.clone()));
//!     Scheduler::new(engine, &config.schedule).run().await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - Client registration, refresh token and hub construction
//! - [`client`] - Gmail API calls
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration management
//! - [`engine`] - Reply decision engine
//! - [`error`] - Error types and result aliases
//! - [`label_manager`] - Marker label lookup and creation
//! - [`mailbox`] - Failure-tolerant wrappers over the mail service
//! - [`models`] - Core data structures
//! - [`reply`] - Recipient extraction and reply composition
//! - [`scheduler`] - Randomized tick scheduling

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod label_manager;
pub mod mailbox;
pub mod models;
pub mod reply;
pub mod scheduler;

pub use error::{ErrorKind, ResponderError, Result};

pub use models::{
    LabelInfo, MessageDetails, MessageOutcome, OutgoingReply, SentReceipt, ThreadSummary,
    TickReport,
};

pub use config::{ClientConfig, Config, IntervalMode, ResponderConfig, ScheduleConfig};

pub use client::{GmailMailService, MailService};
pub use engine::ReplyEngine;
pub use label_manager::MarkerLabel;
pub use mailbox::Mailbox;
pub use scheduler::Scheduler;

pub use cli::{Cli, Commands};
