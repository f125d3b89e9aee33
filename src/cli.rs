//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gmail-vacation-responder")]
#[command(version)]
#[command(about = "Answers unread Gmail threads once with a vacation reply", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 client registration file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to the stored refresh token
    #[arg(long, default_value = "token.json")]
    pub token: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Poll and reply at random intervals until killed (default)
    Run,

    /// Run a single tick and exit
    Once,

    /// Generate an example configuration file
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// The subcommand to execute; a bare invocation means `run`
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
